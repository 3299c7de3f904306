//! Admin handlers: manual cleanup trigger and metrics exposure.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use cutout_core::metrics::MetricsSnapshot;
use cutout_queue::JobQueue;

use crate::dto::request::CleanupRequest;
use crate::dto::response::CleanupQueuedResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/admin/cleanup — enqueue an immediate cleanup job.
pub async fn trigger_cleanup(
    State(state): State<AppState>,
    body: Option<Json<CleanupRequest>>,
) -> ApiResult<(StatusCode, Json<CleanupQueuedResponse>)> {
    let older_than_seconds = body
        .and_then(|Json(req)| req.older_than_seconds)
        .unwrap_or(state.config.cleanup.older_than_seconds);

    let job = state.submission.submit_cleanup(older_than_seconds).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CleanupQueuedResponse {
            cleanup_job_id: job.id,
            status: job.status,
        }),
    ))
}

/// GET /api/metrics — JSON snapshot of counters and gauges.
pub async fn metrics_json(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    refresh_queue_gauges(&state).await;
    Json(state.metrics.snapshot())
}

/// GET /metrics — plain-text exposition for scrapers.
pub async fn metrics_text(State(state): State<AppState>) -> Response {
    refresh_queue_gauges(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.render_text(),
    )
        .into_response()
}

/// Pulls live queue depths into the gauge set. A queue hiccup degrades the
/// snapshot to stale gauges instead of failing the scrape.
async fn refresh_queue_gauges(state: &AppState) {
    match state.queue.stats().await {
        Ok(stats) => {
            state.metrics.set_gauge("queue_queued", stats.queued as i64);
            state.metrics.set_gauge("queue_started", stats.started as i64);
            state.metrics.set_gauge("queue_failed", stats.failed as i64);
        }
        Err(e) => warn!(error = %e, "Failed to refresh queue gauges"),
    }
}
