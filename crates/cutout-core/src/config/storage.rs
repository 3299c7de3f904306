//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Public endpoint substituted into presigned URLs handed to clients.
    /// Empty means the internal endpoint is used as-is.
    #[serde(default)]
    pub public_endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket holding job outputs.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Access key ID.
    #[serde(default = "default_access_key")]
    pub access_key: String,
    /// Secret access key.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Lifetime of presigned download URLs, in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            public_endpoint: String::new(),
            region: default_region(),
            bucket: default_bucket(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            signed_url_ttl_seconds: default_signed_url_ttl(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket() -> String {
    "cutout-assets".to_string()
}

fn default_access_key() -> String {
    "minioadmin".to_string()
}

fn default_secret_key() -> String {
    "minioadmin".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3_600
}
