use std::sync::Arc;

use chrono::Utc;
use cutout_core::traits::ObjectStorage;
use cutout_core::{AppError, AppResult};
use cutout_entity::{Job, JobResult, JobStatus};
use cutout_queue::JobQueue;
use serde::Serialize;
use uuid::Uuid;

/// What a polling client sees for one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusPayload {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StatusService {
    queue: Arc<dyn JobQueue>,
    storage: Arc<dyn ObjectStorage>,
    signed_url_ttl_seconds: u64,
}

impl StatusService {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        storage: Arc<dyn ObjectStorage>,
        signed_url_ttl_seconds: u64,
    ) -> Self {
        Self {
            queue,
            storage,
            signed_url_ttl_seconds,
        }
    }

    pub async fn fetch(&self, id: Uuid) -> AppResult<Job> {
        self.queue
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))
    }

    pub async fn status(&self, id: Uuid) -> AppResult<JobStatusPayload> {
        let job = self.fetch(id).await?;

        let mut payload = JobStatusPayload {
            job_id: job.id,
            status: job.status,
            progress: job.meta.progress,
            stage: job.meta.stage.clone(),
            error: job.meta.error.clone(),
            current: job.meta.current,
            total: job.meta.total,
            download_url: None,
            eta_seconds: None,
        };

        match job.status {
            JobStatus::Finished => {
                payload.progress = 100;
                payload.stage = "done".to_string();
                if let Some(JobResult::Output { storage_key, .. }) = &job.result {
                    let url = self
                        .storage
                        .sign(storage_key, self.signed_url_ttl_seconds)
                        .await?;
                    payload.download_url = Some(url);
                }
            }
            JobStatus::Queued | JobStatus::Started => {
                if let Some(started_at) = job.started_at {
                    let elapsed = (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0;
                    payload.eta_seconds = eta_seconds(elapsed, job.meta.progress);
                }
            }
            JobStatus::Failed | JobStatus::Canceled => {}
        }

        Ok(payload)
    }
}

/// Naive linear projection of remaining time from observed progress.
/// Returns `None` until any progress has been reported.
pub fn eta_seconds(elapsed_seconds: f64, progress: u8) -> Option<u64> {
    if progress == 0 || elapsed_seconds < 0.0 {
        return None;
    }
    let fraction = f64::from(progress) / 100.0;
    let estimated_total = (elapsed_seconds / fraction).round().max(elapsed_seconds);
    Some((estimated_total - elapsed_seconds).max(0.0).round() as u64)
}
