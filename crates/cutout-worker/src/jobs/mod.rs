//! Job pipelines, one module per job kind.

pub mod cleanup;
pub mod remove;

use cutout_core::AppResult;
use cutout_entity::JobMeta;
use cutout_queue::JobQueue;
use uuid::Uuid;

use crate::executor::JobContext;

/// Publishes a progress checkpoint for the job.
pub(crate) async fn report(
    ctx: &JobContext,
    job_id: Uuid,
    progress: u8,
    stage: &str,
) -> AppResult<()> {
    let meta = JobMeta {
        progress,
        stage: stage.to_string(),
        ..JobMeta::default()
    };
    ctx.queue.save_meta(job_id, &meta).await
}

/// Like [`report`], but carries batch position counters.
pub(crate) async fn report_batch(
    ctx: &JobContext,
    job_id: Uuid,
    progress: u8,
    stage: &str,
    current: u32,
    total: u32,
) -> AppResult<()> {
    let meta = JobMeta {
        progress,
        stage: stage.to_string(),
        current: Some(current),
        total: Some(total),
        ..JobMeta::default()
    };
    ctx.queue.save_meta(job_id, &meta).await
}
