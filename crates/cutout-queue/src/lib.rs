//! # cutout-queue
//!
//! Durable job queue capability: the [`JobQueue`] trait the orchestration
//! core consumes, a Redis-backed runtime for deployments, and an in-memory
//! runtime for tests and single-process use.
//!
//! The queue owns the retry state machine: a failed attempt is either
//! re-scheduled per the job's [`RetryPolicy`](cutout_entity::RetryPolicy)
//! or marked terminally failed once retries are exhausted.

pub mod client;
pub mod keys;
pub mod memory;
pub mod redis_queue;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cutout_core::result::AppResult;
use cutout_entity::{Job, JobMeta, JobPayload, JobResult, JobStatus, RetryPolicy};

pub use client::RedisClient;
pub use memory::MemoryJobQueue;
pub use redis_queue::RedisJobQueue;

/// Parameters for creating a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    /// Work to carry.
    pub payload: JobPayload,
    /// Backoff schedule for failed attempts.
    pub retry: RetryPolicy,
    /// Retention of the finished record, in seconds.
    pub result_ttl_seconds: u64,
    /// Retention of the failed record, in seconds.
    pub failure_ttl_seconds: u64,
}

/// What the queue runtime decided about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Re-queued; the job becomes dequeuable after the delay.
    Scheduled {
        /// Which retry this is, 0-based.
        retry_index: u32,
        /// Backoff applied before the job re-enters the queue.
        delay_seconds: u64,
    },
    /// No further attempts; the record is terminal.
    Exhausted,
}

/// Queue bookkeeping exposed for metrics gauges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting (ready or scheduled for retry).
    pub queued: u64,
    /// Jobs currently held by a worker.
    pub started: u64,
    /// Jobs that failed terminally.
    pub failed: u64,
}

/// Shared, at-least-once work queue.
///
/// Implementations must make [`dequeue`](Self::dequeue) atomic: no two
/// callers ever receive the same job instance.
#[async_trait]
pub trait JobQueue: Send + Sync + std::fmt::Debug {
    /// Append a new job; never blocks on processing. Returns the queued job.
    async fn enqueue(&self, submission: JobSubmission) -> AppResult<Job>;

    /// Look up a job by id.
    async fn fetch(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Atomically claim the next available job, marking it Started and
    /// counting the attempt. Returns `None` when nothing is due.
    async fn dequeue(&self) -> AppResult<Option<Job>>;

    /// Persist execution metadata for a job the caller currently holds.
    async fn save_meta(&self, id: Uuid, meta: &JobMeta) -> AppResult<()>;

    /// Record a successful outcome. Also called for a job canceled while it
    /// was already running; completion wins over cooperative cancellation.
    async fn complete(&self, id: Uuid, result: JobResult) -> AppResult<()>;

    /// Record a failed attempt and run the retry state machine.
    async fn fail_attempt(&self, id: Uuid, error: &str) -> AppResult<FailureOutcome>;

    /// Cancel a job. Terminal jobs are left untouched; the current status is
    /// returned either way. Canceling a Started job does not interrupt it.
    async fn cancel(&self, id: Uuid) -> AppResult<JobStatus>;

    /// Read queue bookkeeping.
    async fn stats(&self) -> AppResult<QueueStats>;
}
