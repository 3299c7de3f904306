//! Storage cleanup pipeline — deletes expired job artifacts.

use chrono::Utc;
use cutout_core::traits::ObjectStorage;
use cutout_core::AppResult;
use cutout_entity::JobResult;
use tracing::{debug, info};
use uuid::Uuid;

use crate::executor::JobContext;
use crate::jobs::report;

const JOBS_PREFIX: &str = "jobs/";

pub async fn run(
    ctx: &JobContext,
    job_id: Uuid,
    older_than_seconds: u64,
) -> AppResult<JobResult> {
    report(ctx, job_id, 5, "scan").await?;

    let objects = ctx.storage.list(JOBS_PREFIX).await?;
    let scanned = objects.len() as u64;
    let now = Utc::now();
    let mut deleted = 0u64;

    for object in objects {
        let age_seconds = (now - object.last_modified).num_seconds();
        if age_seconds >= older_than_seconds as i64 {
            debug!(key = %object.key, age_seconds, "Deleting expired artifact");
            ctx.storage.delete(&object.key).await?;
            deleted += 1;
        }
    }

    report(ctx, job_id, 100, "done").await?;
    ctx.metrics.increment("cleanup_deleted", deleted);
    info!(%job_id, scanned, deleted, "Cleanup job finished");

    Ok(JobResult::Cleanup { scanned, deleted })
}
