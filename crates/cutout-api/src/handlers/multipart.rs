//! Shared multipart form parsing for submission endpoints.

use axum::extract::Multipart;
use cutout_core::{AppError, AppResult};
use cutout_entity::RemovalOptions;
use cutout_service::Upload;

/// Parsed submission form: the uploaded files plus refinement knobs.
#[derive(Debug)]
pub struct SubmissionForm {
    pub uploads: Vec<Upload>,
    pub options: RemovalOptions,
}

/// Accepts `file` or `files` fields (repeatable) and optional
/// `feather_radius` / `alpha_boost` text fields.
pub async fn parse_submission(mut multipart: Multipart) -> AppResult<SubmissionForm> {
    let mut uploads = Vec::new();
    let mut options = RemovalOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" | "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                uploads.push(Upload {
                    name: file_name,
                    content_type,
                    bytes,
                });
            }
            "feather_radius" => {
                options.feather_radius = parse_number(field, "feather_radius").await?;
            }
            "alpha_boost" => {
                options.alpha_boost = parse_number(field, "alpha_boost").await?;
            }
            _ => {}
        }
    }

    Ok(SubmissionForm { uploads, options })
}

async fn parse_number(field: axum::extract::multipart::Field<'_>, name: &str) -> AppResult<f32> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Read error on '{name}': {e}")))?;
    text.trim()
        .parse::<f32>()
        .map_err(|_| AppError::validation(format!("'{name}' must be a number, got '{text}'")))
}
