//! Worker runner — main loop that polls the queue and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use cutout_core::config::WorkerConfig;
use cutout_queue::{FailureOutcome, JobQueue};
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, trace, warn};

use crate::executor::JobExecutor;

/// Polls the queue and runs jobs on a bounded number of concurrent slots.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<dyn JobQueue>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            queue,
            executor,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to `true`, then drain in-flight
    /// jobs with a bounded wait.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            "Worker '{}' started with concurrency={}, poll_interval={}s",
            self.worker_id, self.config.concurrency, self.config.poll_interval_seconds
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency.max(1)));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Worker '{}' received shutdown signal", self.worker_id);
                        break;
                    }
                }
                _ = self.poll_and_execute(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                info!("Worker '{}' shutting down", self.worker_id);
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!(
            "Worker '{}' waiting for in-flight jobs to complete...",
            self.worker_id
        );
        let max_permits = self.config.concurrency.max(1) as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;
        info!("Worker '{}' shut down complete", self.worker_id);
    }

    async fn poll_and_execute(&self, semaphore: &Arc<tokio::sync::Semaphore>) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                trace!("All worker slots occupied, waiting...");
                return;
            }
        };

        match self.queue.dequeue().await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);
                let job_id = job.id;
                let kind = job.kind();
                let attempts = job.attempts;

                tokio::spawn(async move {
                    let _permit = permit;
                    info!(%job_id, ?kind, attempt = attempts, "Processing job");

                    match executor.execute(&job).await {
                        Ok(result) => {
                            if let Err(e) = queue.complete(job_id, result).await {
                                error!(%job_id, error = %e, "Failed to mark job as finished");
                            } else {
                                info!(%job_id, "Job completed successfully");
                            }
                        }
                        Err(err) => {
                            match queue.fail_attempt(job_id, &err.message).await {
                                Ok(FailureOutcome::Scheduled {
                                    retry_index,
                                    delay_seconds,
                                }) => {
                                    warn!(
                                        %job_id,
                                        error = %err,
                                        retry_index,
                                        delay_seconds,
                                        "Job failed, retry scheduled"
                                    );
                                }
                                Ok(FailureOutcome::Exhausted) => {
                                    error!(%job_id, error = %err, "Job failed permanently");
                                }
                                Err(e) => {
                                    error!(%job_id, error = %e, "Failed to record job failure");
                                }
                            }
                        }
                    }
                });
            }
            Ok(None) => {
                drop(permit);
                trace!("No jobs available");
            }
            Err(e) => {
                drop(permit);
                error!(error = %e, "Failed to dequeue job");
            }
        }
    }
}
