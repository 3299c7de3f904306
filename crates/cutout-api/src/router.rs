//! Route definitions for the Cutout HTTP API.
//!
//! All routes are mounted under `/api`, except the plain-text metrics
//! exposition which lives at `/metrics` for scrapers.

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Batches of max-size images must fit in one request body.
    let max_body = (state.config.limits.max_image_bytes
        * (state.config.limits.max_batch_files as u64 + 1)) as usize;

    // Everything that creates work is rate limited; polling is not.
    let submission_routes = Router::new()
        .route("/jobs", post(handlers::jobs::submit_job))
        .route("/jobs/batch", post(handlers::jobs::submit_batch))
        .route("/jobs/{id}/retry", post(handlers::jobs::retry_job))
        .route("/remove", post(handlers::sync::remove_now))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::enforce,
        ));

    let read_routes = Router::new()
        .route("/jobs/{id}", get(handlers::jobs::job_status))
        .route("/jobs/{id}/cancel", post(handlers::jobs::cancel_job))
        .route("/jobs/{id}/download", get(handlers::jobs::download));

    let admin_routes = Router::new()
        .route("/admin/cleanup", post(handlers::admin::trigger_cleanup))
        .route("/metrics", get(handlers::admin::metrics_json));

    let api_routes = Router::new()
        .merge(submission_routes)
        .merge(read_routes)
        .merge(admin_routes)
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::admin::metrics_text))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}
