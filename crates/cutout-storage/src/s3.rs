//! S3-compatible object storage provider.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use cutout_core::config::storage::StorageConfig;
use cutout_core::error::AppError;
use cutout_core::result::AppResult;
use cutout_core::traits::storage::{ObjectMeta, ObjectStorage};

/// S3-compatible storage provider for job outputs.
#[derive(Debug, Clone)]
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    public_endpoint: Option<String>,
}

impl S3ObjectStorage {
    /// Create a provider from configuration.
    pub fn new(config: &StorageConfig) -> Self {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 storage provider"
        );

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "cutout-static",
        );
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_endpoint: if config.public_endpoint.is_empty() {
                None
            } else {
                Some(config.public_endpoint.trim_end_matches('/').to_string())
            },
        }
    }

    /// Create the bucket if it does not exist yet.
    pub async fn ensure_bucket(&self) -> AppResult<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    cutout_core::error::ErrorKind::Storage,
                    format!("Failed to create bucket '{}': {e}", self.bucket),
                    e,
                )
            })?;
        info!(bucket = %self.bucket, "Created bucket");
        Ok(())
    }

    /// Swap the internal endpoint out of a presigned URL for the public one.
    fn to_public_url(&self, signed_url: String) -> String {
        let Some(public) = &self.public_endpoint else {
            return signed_url;
        };
        let Some(scheme_end) = signed_url.find("://") else {
            return signed_url;
        };
        let authority_start = scheme_end + 3;
        match signed_url[authority_start..].find('/') {
            Some(path_offset) => {
                format!("{public}{}", &signed_url[authority_start + path_offset..])
            }
            None => public.clone(),
        }
    }
}

fn storage_err(
    context: &str,
    e: impl std::error::Error + Send + Sync + 'static,
) -> AppError {
    AppError::with_source(
        cutout_core::error::ErrorKind::Storage,
        format!("{context}: {e}"),
        e,
    )
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| storage_err("Failed to put object", e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_err("Failed to get object", e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| storage_err("Failed to read object body", e))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_err("Failed to delete object", e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| storage_err("Failed to list objects", e))?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let Some(modified) = object.last_modified() else {
                    continue;
                };
                let last_modified =
                    DateTime::<Utc>::from_timestamp(modified.secs(), modified.subsec_nanos())
                        .unwrap_or_default();
                items.push(ObjectMeta {
                    key: key.to_string(),
                    last_modified,
                });
            }
        }
        Ok(items)
    }

    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_seconds))
            .map_err(|e| storage_err("Invalid presigning expiry", e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| storage_err("Failed to presign URL", e))?;

        Ok(self.to_public_url(request.uri().to_string()))
    }
}
