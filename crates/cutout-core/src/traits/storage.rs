//! Object storage capability trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::result::AppResult;

/// Metadata about a stored object, as returned by prefix listings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Object key.
    pub key: String,
    /// Last modified timestamp.
    pub last_modified: DateTime<Utc>,
}

/// Narrow interface to the object store holding job outputs.
///
/// Job outputs live under `jobs/{job_id}/{name}`. The implementation is
/// expected to provide its own concurrency safety and strong per-key
/// read-after-write consistency.
#[async_trait]
pub trait ObjectStorage: Send + Sync + std::fmt::Debug {
    /// Write an object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Read an object into memory.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// List all objects under a key prefix.
    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectMeta>>;

    /// Produce a presigned download URL valid for `ttl_seconds`.
    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String>;
}
