//! Synchronous removal endpoint — processes one image inline and returns
//! the PNG directly. Meant for demos and smoke tests; production clients
//! should go through the job queue.

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;

use cutout_core::AppError;
use cutout_service::validate_image_bytes;

use crate::error::ApiResult;
use crate::handlers::multipart::parse_submission;
use crate::state::AppState;

/// POST /api/remove
pub async fn remove_now(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let mut form = parse_submission(multipart).await?;
    let upload = match form.uploads.len() {
        1 => form.uploads.remove(0),
        _ => return Err(AppError::validation("Exactly one 'file' field is required").into()),
    };

    form.options.validate()?;
    if !upload.content_type.starts_with("image/") {
        return Err(AppError::validation(format!(
            "Content type '{}' is not an image",
            upload.content_type
        ))
        .into());
    }
    if upload.bytes.len() as u64 > state.config.limits.max_image_bytes {
        return Err(AppError::validation(format!(
            "File is {} bytes, limit is {} bytes",
            upload.bytes.len(),
            state.config.limits.max_image_bytes
        ))
        .into());
    }
    validate_image_bytes(&upload.bytes, state.config.limits.max_image_pixels)?;

    let cutout = state.removal.process(upload.bytes, form.options).await?;
    state.metrics.increment("images_processed", 1);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(cutout))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
