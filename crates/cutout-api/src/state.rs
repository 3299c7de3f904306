//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use cutout_core::config::AppConfig;
use cutout_core::metrics::MetricsStore;
use cutout_core::traits::{BackgroundRemover, ObjectStorage};
use cutout_queue::JobQueue;
use cutout_service::{RemovalService, StatusService, SubmissionService};

use crate::middleware::rate_limit::RateLimiter;

/// Shared dependencies, passed to every handler via `State<AppState>`.
/// Every field is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<dyn ObjectStorage>,
    pub metrics: Arc<MetricsStore>,
    pub submission: Arc<SubmissionService>,
    pub status: Arc<StatusService>,
    pub removal: RemovalService,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire up all services from the infrastructure singletons.
    pub fn new(
        config: Arc<AppConfig>,
        queue: Arc<dyn JobQueue>,
        storage: Arc<dyn ObjectStorage>,
        remover: Arc<dyn BackgroundRemover>,
        metrics: Arc<MetricsStore>,
    ) -> Self {
        let submission = Arc::new(SubmissionService::new(
            queue.clone(),
            metrics.clone(),
            config.limits.clone(),
            &config.queue,
        ));
        let status = Arc::new(StatusService::new(
            queue.clone(),
            storage.clone(),
            config.storage.signed_url_ttl_seconds,
        ));
        let removal = RemovalService::new(remover, config.limits.inference_concurrency);
        let rate_limiter = RateLimiter::new(config.limits.rate_limit_per_minute);

        Self {
            config,
            queue,
            storage,
            metrics,
            submission,
            status,
            removal,
            rate_limiter,
        }
    }
}
