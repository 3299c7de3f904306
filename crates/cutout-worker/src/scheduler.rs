//! Periodic enqueue of storage cleanup jobs.

use std::sync::Arc;
use std::time::Duration;

use cutout_core::config::{CleanupConfig, QueueConfig};
use cutout_entity::{JobPayload, RetryPolicy};
use cutout_queue::{JobQueue, JobSubmission};
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info};

/// Enqueues a cleanup job on a fixed interval. The job itself runs through
/// the normal queue, so it shares the worker's retry and failure accounting.
#[derive(Debug)]
pub struct CleanupScheduler {
    queue: Arc<dyn JobQueue>,
    cleanup: CleanupConfig,
    retry: RetryPolicy,
    result_ttl_seconds: u64,
    failure_ttl_seconds: u64,
}

impl CleanupScheduler {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        cleanup: CleanupConfig,
        queue_config: &QueueConfig,
    ) -> Self {
        Self {
            queue,
            cleanup,
            retry: RetryPolicy::new(
                queue_config.retry_max_attempts,
                queue_config.retry_intervals_seconds.clone(),
            ),
            result_ttl_seconds: queue_config.result_ttl_seconds,
            failure_ttl_seconds: queue_config.failure_ttl_seconds,
        }
    }

    /// Run until the cancel signal flips to `true`. Enqueue failures are
    /// logged and the next tick tries again.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let interval_seconds = self.cleanup.effective_interval_seconds();
        info!(
            interval_seconds,
            older_than_seconds = self.cleanup.older_than_seconds,
            "Cleanup scheduler started"
        );
        let mut ticker = time::interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // The first tick fires immediately; swallow it so an enqueue happens
        // one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Cleanup scheduler received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.enqueue_cleanup().await;
                }
            }
        }
    }

    async fn enqueue_cleanup(&self) {
        let submission = JobSubmission {
            payload: JobPayload::Cleanup {
                older_than_seconds: self.cleanup.older_than_seconds,
            },
            retry: self.retry.clone(),
            result_ttl_seconds: self.result_ttl_seconds,
            failure_ttl_seconds: self.failure_ttl_seconds,
        };
        match self.queue.enqueue(submission).await {
            Ok(job) => info!(job_id = %job.id, "Enqueued scheduled cleanup job"),
            Err(e) => error!(error = %e, "Failed to enqueue scheduled cleanup job"),
        }
    }
}
