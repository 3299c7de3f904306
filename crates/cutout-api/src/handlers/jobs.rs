//! Job submission, status, cancel, retry, and download handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use cutout_core::traits::ObjectStorage;
use cutout_core::AppError;
use cutout_entity::{JobResult, JobStatus};
use cutout_queue::JobQueue;
use cutout_service::status::JobStatusPayload;

use crate::dto::response::{CancelResponse, JobCreatedResponse, RetryResponse};
use crate::error::ApiResult;
use crate::handlers::multipart::parse_submission;
use crate::state::AppState;

/// POST /api/jobs — submit one image for background removal.
pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobCreatedResponse>)> {
    let mut form = parse_submission(multipart).await?;
    let upload = match form.uploads.len() {
        1 => form.uploads.remove(0),
        0 => return Err(AppError::validation("A 'file' field is required").into()),
        n => {
            return Err(AppError::validation(format!(
                "Expected one file, got {n}; use /api/jobs/batch for multiple files"
            ))
            .into())
        }
    };

    let job = state.submission.submit_single(upload, form.options).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            job_id: job.id,
            status: job.status,
        }),
    ))
}

/// POST /api/jobs/batch — submit several images, producing one zip.
pub async fn submit_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobCreatedResponse>)> {
    let form = parse_submission(multipart).await?;
    let job = state
        .submission
        .submit_batch(form.uploads, form.options)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            job_id: job.id,
            status: job.status,
        }),
    ))
}

/// GET /api/jobs/{id} — poll job progress.
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobStatusPayload>> {
    let payload = state.status.status(id).await?;
    Ok(Json(payload))
}

/// POST /api/jobs/{id}/cancel — request cooperative cancellation.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    let status = state.queue.cancel(id).await?;
    Ok(Json(CancelResponse { job_id: id, status }))
}

/// POST /api/jobs/{id}/retry — clone a failed job with a fresh retry budget.
pub async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<RetryResponse>)> {
    let job = state.status.fetch(id).await?;
    let clone = state.submission.resubmit(&job).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RetryResponse {
            job_id: clone.id,
            previous_job_id: id,
            status: clone.status,
        }),
    ))
}

/// GET /api/jobs/{id}/download — stream the finished artifact.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let job = state.status.fetch(id).await?;
    if job.status != JobStatus::Finished {
        return Err(AppError::conflict(format!(
            "Job {id} is {} and has no artifact to download yet",
            job.status
        ))
        .into());
    }

    let Some(JobResult::Output {
        storage_key,
        filename,
        content_type,
    }) = job.result
    else {
        return Err(AppError::conflict(format!("Job {id} produced no downloadable artifact")).into());
    };

    let data = state.storage.get(&storage_key).await?;
    state.metrics.increment("downloads", 1);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
