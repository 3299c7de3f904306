//! Response DTOs.

use cutout_entity::JobStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned on job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreatedResponse {
    /// Identifier to poll for status.
    pub job_id: Uuid,
    /// Initial job status.
    pub status: JobStatus,
}

/// Returned on a cancel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub job_id: Uuid,
    /// Status after the cancel request was applied.
    pub status: JobStatus,
}

/// Returned when a failed job is retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryResponse {
    /// The freshly enqueued job.
    pub job_id: Uuid,
    /// The failed job it was cloned from.
    pub previous_job_id: Uuid,
    pub status: JobStatus,
}

/// Returned when a cleanup job is triggered manually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupQueuedResponse {
    pub cleanup_job_id: Uuid,
    pub status: JobStatus,
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
