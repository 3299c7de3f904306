use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cutout_core::config::RemoverConfig;
use cutout_core::traits::BackgroundRemover;
use cutout_core::{AppError, AppResult};
use tracing::debug;

/// Client for the external background removal model server. The server
/// accepts raw image bytes and answers with a PNG carrying an alpha matte.
#[derive(Debug, Clone)]
pub struct HttpBackgroundRemover {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackgroundRemover {
    pub fn new(config: &RemoverConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| {
                AppError::external("Failed to build HTTP client for remover").caused_by(err)
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl BackgroundRemover for HttpBackgroundRemover {
    async fn remove(&self, image: Bytes) -> AppResult<Bytes> {
        let input_len = image.len();
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|err| {
                AppError::external(format!("Remover request to {} failed", self.endpoint))
                    .caused_by(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external(format!(
                "Remover returned HTTP {status}"
            )));
        }

        let output = response.bytes().await.map_err(|err| {
            AppError::external("Failed to read remover response body").caused_by(err)
        })?;

        debug!(input_len, output_len = output.len(), "Background removal call completed");
        Ok(output)
    }
}
