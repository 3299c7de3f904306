//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payload::JobPayload;
use super::retry::RetryPolicy;
use super::status::{JobKind, JobStatus};

/// Mutable per-job execution metadata, saved explicitly by whoever holds
/// the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    /// Completion estimate, 0-100. Non-decreasing while the job is live;
    /// reset to 0 only on failure.
    pub progress: u8,
    /// Human-readable sub-step label.
    pub stage: String,
    /// Error message recorded on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Trace reference recorded alongside the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Batch progress: items completed so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u32>,
    /// Batch progress: total item count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl Default for JobMeta {
    fn default() -> Self {
        Self {
            progress: 0,
            stage: "queued".to_string(),
            error: None,
            trace: None,
            current: None,
            total: None,
        }
    }
}

/// Outcome of a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobResult {
    /// Downloadable artifact produced by a single or batch job.
    Output {
        /// Key under which the artifact was stored.
        storage_key: String,
        /// Suggested download filename.
        filename: String,
        /// Artifact MIME type.
        content_type: String,
    },
    /// Counters returned by a cleanup run.
    Cleanup {
        /// Objects inspected.
        scanned: u64,
        /// Objects deleted.
        deleted: u64,
    },
}

/// A background job tracked by the durable queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Current status.
    pub status: JobStatus,
    /// Work carried by this job.
    pub payload: JobPayload,
    /// Backoff schedule owned by the queue runtime.
    pub retry: RetryPolicy,
    /// Executions attempted so far (successful or not).
    pub attempts: u32,
    /// Execution metadata.
    pub meta: JobMeta,
    /// Outcome, set once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Retention of the finished record, in seconds.
    pub result_ttl_seconds: u64,
    /// Retention of the failed record, in seconds.
    pub failure_ttl_seconds: u64,
    /// When the job was submitted.
    pub created_at: DateTime<Utc>,
    /// When the current (or last) execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Kind of work this job carries, derived from its payload.
    pub fn kind(&self) -> JobKind {
        match &self.payload {
            JobPayload::Single { .. } => JobKind::Single,
            JobPayload::Batch { .. } => JobKind::Batch,
            JobPayload::Cleanup { .. } => JobKind::Cleanup,
        }
    }

    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::payload::RemovalOptions;

    fn sample_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            payload: JobPayload::Single {
                name: "a.png".to_string(),
                bytes: vec![1, 2, 3],
                options: RemovalOptions::default(),
            },
            retry: RetryPolicy::default(),
            attempts: 0,
            meta: JobMeta::default(),
            result: None,
            result_ttl_seconds: 86_400,
            failure_ttl_seconds: 86_400,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_kind_follows_payload() {
        let mut job = sample_job();
        assert_eq!(job.kind(), JobKind::Single);

        job.payload = JobPayload::Cleanup {
            older_than_seconds: 60,
        };
        assert_eq!(job.kind(), JobKind::Cleanup);
    }

    #[test]
    fn test_job_json_roundtrip() {
        let job = sample_job();
        let json = serde_json::to_string(&job).expect("serialize");
        let back: Job = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.id, job.id);
        assert_eq!(back.payload, job.payload);
        assert_eq!(back.retry, job.retry);
    }
}
