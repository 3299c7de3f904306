use std::sync::Arc;

use bytes::Bytes;
use cutout_core::config::{LimitsConfig, QueueConfig};
use cutout_core::metrics::MetricsStore;
use cutout_core::{AppError, AppResult};
use cutout_entity::{BatchItem, Job, JobPayload, RemovalOptions, RetryPolicy};
use cutout_queue::{JobQueue, JobSubmission};
use tracing::info;

use crate::validation::validate_image_bytes;

/// One uploaded file, as extracted from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Validates uploads and turns them into queued jobs.
#[derive(Debug, Clone)]
pub struct SubmissionService {
    queue: Arc<dyn JobQueue>,
    metrics: Arc<MetricsStore>,
    limits: LimitsConfig,
    retry: RetryPolicy,
    result_ttl_seconds: u64,
    failure_ttl_seconds: u64,
}

impl SubmissionService {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        metrics: Arc<MetricsStore>,
        limits: LimitsConfig,
        queue_config: &QueueConfig,
    ) -> Self {
        Self {
            queue,
            metrics,
            limits,
            retry: RetryPolicy::new(
                queue_config.retry_max_attempts,
                queue_config.retry_intervals_seconds.clone(),
            ),
            result_ttl_seconds: queue_config.result_ttl_seconds,
            failure_ttl_seconds: queue_config.failure_ttl_seconds,
        }
    }

    pub async fn submit_single(&self, upload: Upload, options: RemovalOptions) -> AppResult<Job> {
        self.checked(|| {
            options.validate()?;
            self.validate_upload(&upload, None)
        })?;

        let job = self
            .enqueue(JobPayload::Single {
                name: upload.name.clone(),
                bytes: upload.bytes.to_vec(),
                options,
            })
            .await?;
        info!(job_id = %job.id, file = %upload.name, "Queued background removal job");
        self.metrics.increment("jobs_submitted", 1);
        Ok(job)
    }

    pub async fn submit_batch(
        &self,
        uploads: Vec<Upload>,
        options: RemovalOptions,
    ) -> AppResult<Job> {
        self.checked(|| {
            options.validate()?;
            if uploads.is_empty() {
                return Err(AppError::validation("Batch contains no files"));
            }
            if uploads.len() > self.limits.max_batch_files {
                return Err(AppError::validation(format!(
                    "Batch has {} files, limit is {}",
                    uploads.len(),
                    self.limits.max_batch_files
                )));
            }
            for (index, upload) in uploads.iter().enumerate() {
                self.validate_upload(upload, Some(index))?;
            }
            Ok(())
        })?;

        let count = uploads.len();
        let items = uploads
            .into_iter()
            .map(|upload| BatchItem {
                name: upload.name,
                bytes: upload.bytes.to_vec(),
            })
            .collect();
        let job = self.enqueue(JobPayload::Batch { items, options }).await?;
        info!(job_id = %job.id, files = count, "Queued batch removal job");
        self.metrics.increment("jobs_submitted", 1);
        Ok(job)
    }

    pub async fn submit_cleanup(&self, older_than_seconds: u64) -> AppResult<Job> {
        let job = self
            .enqueue(JobPayload::Cleanup { older_than_seconds })
            .await?;
        info!(job_id = %job.id, older_than_seconds, "Queued storage cleanup job");
        Ok(job)
    }

    /// Re-submits a failed job as a brand new job with a fresh retry budget.
    pub async fn resubmit(&self, job: &Job) -> AppResult<Job> {
        if !job.status.can_retry() {
            return Err(AppError::conflict(format!(
                "Job {} is {} and cannot be retried",
                job.id, job.status
            )));
        }
        let clone = self.enqueue(job.payload.clone()).await?;
        info!(job_id = %clone.id, previous = %job.id, "Re-queued failed job");
        self.metrics.increment("jobs_retried", 1);
        Ok(clone)
    }

    async fn enqueue(&self, payload: JobPayload) -> AppResult<Job> {
        self.queue
            .enqueue(JobSubmission {
                payload,
                retry: self.retry.clone(),
                result_ttl_seconds: self.result_ttl_seconds,
                failure_ttl_seconds: self.failure_ttl_seconds,
            })
            .await
    }

    fn validate_upload(&self, upload: &Upload, index: Option<usize>) -> AppResult<()> {
        let at = |message: String| match index {
            Some(i) => AppError::validation(format!(
                "File {} ('{}'): {message}",
                i + 1,
                upload.name
            )),
            None => AppError::validation(message),
        };

        if !upload.content_type.starts_with("image/") {
            return Err(at(format!(
                "Content type '{}' is not an image",
                upload.content_type
            )));
        }
        if upload.bytes.len() as u64 > self.limits.max_image_bytes {
            return Err(at(format!(
                "File is {} bytes, limit is {} bytes",
                upload.bytes.len(),
                self.limits.max_image_bytes
            )));
        }
        validate_image_bytes(&upload.bytes, self.limits.max_image_pixels)
            .map(|_| ())
            .map_err(|err| at(err.message))
    }

    fn checked(&self, validate: impl FnOnce() -> AppResult<()>) -> AppResult<()> {
        validate().inspect_err(|_| {
            self.metrics.increment("submissions_rejected", 1);
        })
    }
}
