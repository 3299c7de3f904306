//! In-memory job queue for tests and single-process deployments.
//!
//! Mirrors the Redis runtime's semantics exactly: same retry state machine,
//! same atomic dequeue, same stats bookkeeping. A controllable clock offset
//! lets tests step through backoff schedules without sleeping.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use cutout_core::error::AppError;
use cutout_core::result::AppResult;
use cutout_entity::{Job, JobMeta, JobResult, JobStatus};

use crate::{FailureOutcome, JobQueue, JobSubmission, QueueStats};

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    ready: VecDeque<Uuid>,
    scheduled: Vec<(DateTime<Utc>, Uuid)>,
    started: u64,
    failed: u64,
    clock_offset: Duration,
}

/// Process-local queue runtime behind one mutex.
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    inner: Mutex<Inner>,
}

impl MemoryJobQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the queue's clock. Test hook for stepping through backoff
    /// schedules without real sleeps.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        inner.clock_offset += by;
    }

    fn now(inner: &Inner) -> DateTime<Utc> {
        Utc::now() + inner.clock_offset
    }

    fn promote_due(inner: &mut Inner) {
        let now = Self::now(inner);
        let mut idx = 0;
        while idx < inner.scheduled.len() {
            if inner.scheduled[idx].0 <= now {
                let (_, id) = inner.scheduled.remove(idx);
                inner.ready.push_back(id);
            } else {
                idx += 1;
            }
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, submission: JobSubmission) -> AppResult<Job> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let job = Job {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            payload: submission.payload,
            retry: submission.retry,
            attempts: 0,
            meta: JobMeta::default(),
            result: None,
            result_ttl_seconds: submission.result_ttl_seconds,
            failure_ttl_seconds: submission.failure_ttl_seconds,
            created_at: Self::now(&inner),
            started_at: None,
            completed_at: None,
        };
        inner.jobs.insert(job.id, job.clone());
        inner.ready.push_back(job.id);
        Ok(job)
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Option<Job>> {
        let inner = self.inner.lock().expect("queue mutex poisoned");
        Ok(inner.jobs.get(&id).cloned())
    }

    async fn dequeue(&self) -> AppResult<Option<Job>> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        Self::promote_due(&mut inner);

        while let Some(id) = inner.ready.pop_front() {
            let now = Self::now(&inner);
            let Some(job) = inner.jobs.get_mut(&id) else {
                continue;
            };
            if job.status != JobStatus::Queued {
                continue;
            }
            job.status = JobStatus::Started;
            job.started_at = Some(now);
            job.attempts += 1;
            let claimed = job.clone();
            inner.started += 1;
            return Ok(Some(claimed));
        }
        Ok(None)
    }

    async fn save_meta(&self, id: Uuid, meta: &JobMeta) -> AppResult<()> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        job.meta = meta.clone();
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: JobResult) -> AppResult<()> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let now = Self::now(&inner);
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        job.status = JobStatus::Finished;
        job.result = Some(result);
        job.completed_at = Some(now);
        inner.started = inner.started.saturating_sub(1);
        Ok(())
    }

    async fn fail_attempt(&self, id: Uuid, error: &str) -> AppResult<FailureOutcome> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let now = Self::now(&inner);
        inner.started = inner.started.saturating_sub(1);

        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        job.meta.error = Some(error.to_string());

        if job.status == JobStatus::Canceled {
            return Ok(FailureOutcome::Exhausted);
        }

        let retry_index = job.attempts.saturating_sub(1);
        if retry_index < job.retry.max_attempts {
            let delay_seconds = job.retry.interval_for(retry_index);
            job.status = JobStatus::Queued;
            job.started_at = None;
            let due = now + Duration::seconds(delay_seconds as i64);
            inner.scheduled.push((due, id));
            Ok(FailureOutcome::Scheduled {
                retry_index,
                delay_seconds,
            })
        } else {
            job.status = JobStatus::Failed;
            job.completed_at = Some(now);
            inner.failed += 1;
            Ok(FailureOutcome::Exhausted)
        }
    }

    async fn cancel(&self, id: Uuid) -> AppResult<JobStatus> {
        let mut inner = self.inner.lock().expect("queue mutex poisoned");
        let now = Self::now(&inner);
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;

        if job.is_terminal() {
            return Ok(job.status);
        }
        job.status = JobStatus::Canceled;
        job.completed_at = Some(now);
        // A scheduled retry for this job is now unreachable: dequeue skips
        // anything that is no longer Queued.
        Ok(JobStatus::Canceled)
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        let inner = self.inner.lock().expect("queue mutex poisoned");
        Ok(QueueStats {
            queued: (inner.ready.len() + inner.scheduled.len()) as u64,
            started: inner.started,
            failed: inner.failed,
        })
    }
}
