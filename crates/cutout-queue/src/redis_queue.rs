//! Redis-backed durable job queue.
//!
//! Job records are JSON strings under `{prefix}:job:{id}`. Ready work sits
//! in a list; retries wait in a sorted set scored by due time and are
//! promoted back onto the list at dequeue. The LPUSH/RPOP pair gives the
//! atomic-dequeue guarantee; ZREM arbitrates promotion when several workers
//! see the same due entry.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

use cutout_core::error::{AppError, ErrorKind};
use cutout_core::result::AppResult;
use cutout_entity::{Job, JobMeta, JobResult, JobStatus};

use crate::client::RedisClient;
use crate::keys;
use crate::{FailureOutcome, JobQueue, JobSubmission, QueueStats};

/// Durable queue runtime on Redis.
#[derive(Debug, Clone)]
pub struct RedisJobQueue {
    client: RedisClient,
    queue_name: String,
}

impl RedisJobQueue {
    /// Create a queue handle over an established connection.
    pub fn new(client: RedisClient, queue_name: impl Into<String>) -> Self {
        Self {
            client,
            queue_name: queue_name.into(),
        }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Queue, format!("Redis error: {e}"), e)
    }

    async fn load(&self, id: Uuid) -> AppResult<Option<Job>> {
        let key = keys::job(self.client.prefix(), id);
        let mut conn = self.client.conn_mut();
        let raw: Option<String> = conn.get(&key).await.map_err(Self::map_err)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, job: &Job) -> AppResult<()> {
        let key = keys::job(self.client.prefix(), job.id);
        let json = serde_json::to_string(job)?;
        let mut conn = self.client.conn_mut();
        let _: () = conn.set(&key, json).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn store_with_ttl(&self, job: &Job, ttl_seconds: u64) -> AppResult<()> {
        let key = keys::job(self.client.prefix(), job.id);
        let json = serde_json::to_string(job)?;
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .set_ex(&key, json, ttl_seconds)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    /// Move due retries from the scheduled set onto the ready list.
    ///
    /// ZREM returns 1 for exactly one caller per member, so concurrent
    /// workers cannot promote the same job twice.
    async fn promote_due(&self) -> AppResult<()> {
        let prefix = self.client.prefix();
        let scheduled_key = keys::scheduled(prefix, &self.queue_name);
        let ready_key = keys::ready(prefix, &self.queue_name);
        let now = Utc::now().timestamp() as f64;

        let mut conn = self.client.conn_mut();
        let due: Vec<String> = conn
            .zrangebyscore(&scheduled_key, "-inf", now)
            .await
            .map_err(Self::map_err)?;

        for member in due {
            let removed: u32 = conn
                .zrem(&scheduled_key, &member)
                .await
                .map_err(Self::map_err)?;
            if removed == 1 {
                let _: () = conn
                    .lpush(&ready_key, &member)
                    .await
                    .map_err(Self::map_err)?;
                debug!(job_id = %member, "Promoted scheduled retry");
            }
        }
        Ok(())
    }

    async fn adjust_counter(&self, key: &str, delta: i64) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: i64 = conn.incr(key, delta).await.map_err(Self::map_err)?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, submission: JobSubmission) -> AppResult<Job> {
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
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        self.store(&job).await?;

        let ready_key = keys::ready(self.client.prefix(), &self.queue_name);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .lpush(&ready_key, job.id.to_string())
            .await
            .map_err(Self::map_err)?;

        debug!(job_id = %job.id, kind = %job.kind(), "Enqueued job");
        Ok(job)
    }

    async fn fetch(&self, id: Uuid) -> AppResult<Option<Job>> {
        self.load(id).await
    }

    async fn dequeue(&self) -> AppResult<Option<Job>> {
        self.promote_due().await?;

        let ready_key = keys::ready(self.client.prefix(), &self.queue_name);
        loop {
            let mut conn = self.client.conn_mut();
            let popped: Option<String> = conn
                .rpop(&ready_key, None)
                .await
                .map_err(Self::map_err)?;

            let Some(raw_id) = popped else {
                return Ok(None);
            };
            let Ok(id) = raw_id.parse::<Uuid>() else {
                warn!(raw = %raw_id, "Dropping malformed queue entry");
                continue;
            };

            let Some(mut job) = self.load(id).await? else {
                // Record expired while the id sat in the list.
                continue;
            };
            if job.status != JobStatus::Queued {
                // Canceled (or otherwise settled) before a worker claimed it.
                debug!(job_id = %id, status = %job.status, "Skipping settled job");
                continue;
            }

            job.status = JobStatus::Started;
            job.started_at = Some(Utc::now());
            job.attempts += 1;
            self.store(&job).await?;
            self.adjust_counter(&keys::started_count(self.client.prefix()), 1)
                .await?;

            debug!(job_id = %id, attempt = job.attempts, "Dequeued job");
            return Ok(Some(job));
        }
    }

    async fn save_meta(&self, id: Uuid, meta: &JobMeta) -> AppResult<()> {
        let Some(mut job) = self.load(id).await? else {
            return Err(AppError::not_found(format!("Job {id} not found")));
        };
        job.meta = meta.clone();
        self.store(&job).await
    }

    async fn complete(&self, id: Uuid, result: JobResult) -> AppResult<()> {
        let Some(mut job) = self.load(id).await? else {
            return Err(AppError::not_found(format!("Job {id} not found")));
        };

        job.status = JobStatus::Finished;
        job.result = Some(result);
        job.completed_at = Some(Utc::now());
        let ttl = job.result_ttl_seconds;
        self.store_with_ttl(&job, ttl).await?;
        self.adjust_counter(&keys::started_count(self.client.prefix()), -1)
            .await?;

        debug!(job_id = %id, "Job finished");
        Ok(())
    }

    async fn fail_attempt(&self, id: Uuid, error: &str) -> AppResult<FailureOutcome> {
        let Some(mut job) = self.load(id).await? else {
            return Err(AppError::not_found(format!("Job {id} not found")));
        };

        let prefix = self.client.prefix();
        self.adjust_counter(&keys::started_count(prefix), -1)
            .await?;
        job.meta.error = Some(error.to_string());

        if job.status == JobStatus::Canceled {
            // Cancellation forbids further retries; keep the record around
            // for the failure window.
            let ttl = job.failure_ttl_seconds;
            self.store_with_ttl(&job, ttl).await?;
            return Ok(FailureOutcome::Exhausted);
        }

        let retry_index = job.attempts.saturating_sub(1);
        if retry_index < job.retry.max_attempts {
            let delay_seconds = job.retry.interval_for(retry_index);
            job.status = JobStatus::Queued;
            job.started_at = None;
            self.store(&job).await?;

            let scheduled_key = keys::scheduled(prefix, &self.queue_name);
            let due = Utc::now().timestamp() as f64 + delay_seconds as f64;
            let mut conn = self.client.conn_mut();
            let _: () = conn
                .zadd(&scheduled_key, id.to_string(), due)
                .await
                .map_err(Self::map_err)?;

            debug!(job_id = %id, retry_index, delay_seconds, "Scheduled retry");
            Ok(FailureOutcome::Scheduled {
                retry_index,
                delay_seconds,
            })
        } else {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            let ttl = job.failure_ttl_seconds;
            self.store_with_ttl(&job, ttl).await?;
            self.adjust_counter(&keys::failed_count(prefix), 1).await?;

            debug!(job_id = %id, error, "Job failed terminally");
            Ok(FailureOutcome::Exhausted)
        }
    }

    async fn cancel(&self, id: Uuid) -> AppResult<JobStatus> {
        let Some(mut job) = self.load(id).await? else {
            return Err(AppError::not_found(format!("Job {id} not found")));
        };

        if job.is_terminal() {
            return Ok(job.status);
        }

        job.status = JobStatus::Canceled;
        job.completed_at = Some(Utc::now());
        self.store(&job).await?;

        debug!(job_id = %id, "Job canceled");
        Ok(JobStatus::Canceled)
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        let prefix = self.client.prefix();
        let ready_key = keys::ready(prefix, &self.queue_name);
        let scheduled_key = keys::scheduled(prefix, &self.queue_name);

        let mut conn = self.client.conn_mut();
        let ready: u64 = conn.llen(&ready_key).await.map_err(Self::map_err)?;
        let scheduled: u64 = conn.zcard(&scheduled_key).await.map_err(Self::map_err)?;
        let started: Option<i64> = conn
            .get(keys::started_count(prefix))
            .await
            .map_err(Self::map_err)?;
        let failed: Option<i64> = conn
            .get(keys::failed_count(prefix))
            .await
            .map_err(Self::map_err)?;

        Ok(QueueStats {
            queued: ready + scheduled,
            started: started.unwrap_or(0).max(0) as u64,
            failed: failed.unwrap_or(0).max(0) as u64,
        })
    }
}
