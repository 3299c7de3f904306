//! Job executor — dispatches dequeued jobs to the matching pipeline.

use std::sync::Arc;

use cutout_core::metrics::MetricsStore;
use cutout_core::traits::ObjectStorage;
use cutout_core::AppResult;
use cutout_entity::{Job, JobMeta, JobPayload, JobResult};
use cutout_queue::JobQueue;
use cutout_service::RemovalService;
use tracing::warn;

use crate::jobs;

/// Shared handles every pipeline needs.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<dyn ObjectStorage>,
    pub removal: RemovalService,
    pub metrics: Arc<MetricsStore>,
}

/// Dispatches jobs to the pipeline that matches their payload.
#[derive(Debug)]
pub struct JobExecutor {
    ctx: JobContext,
}

impl JobExecutor {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    /// Run the job to completion. On failure the job's meta is stamped with
    /// the failure details before the error is handed back to the runner,
    /// so clients polling mid-retry see what went wrong.
    pub async fn execute(&self, job: &Job) -> AppResult<JobResult> {
        let outcome = match &job.payload {
            JobPayload::Single {
                name,
                bytes,
                options,
            } => jobs::remove::run_single(&self.ctx, job.id, name, bytes, options).await,
            JobPayload::Batch { items, options } => {
                jobs::remove::run_batch(&self.ctx, job.id, items, options).await
            }
            JobPayload::Cleanup { older_than_seconds } => {
                jobs::cleanup::run(&self.ctx, job.id, *older_than_seconds).await
            }
        };

        if let Err(err) = &outcome {
            // Merge into the latest meta so batch position counters survive
            // the failure stamp.
            let last = match self.ctx.queue.fetch(job.id).await {
                Ok(Some(latest)) => latest.meta,
                _ => job.meta.clone(),
            };
            let meta = JobMeta {
                progress: 0,
                stage: "failed".to_string(),
                error: Some(err.message.clone()),
                trace: Some(format!("{err:?}")),
                current: last.current,
                total: last.total,
            };
            if let Err(save_err) = self.ctx.queue.save_meta(job.id, &meta).await {
                warn!(job_id = %job.id, error = %save_err, "Failed to record failure meta");
            }
        }

        outcome
    }
}
