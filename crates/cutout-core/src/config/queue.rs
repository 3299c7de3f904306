//! Durable queue configuration.

use serde::{Deserialize, Serialize};

/// Settings for the Redis-backed durable job queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Queue name jobs are pushed onto.
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Key prefix for all queue keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Maximum retries after the first failed attempt.
    #[serde(default = "default_retry_max")]
    pub retry_max_attempts: u32,
    /// Backoff intervals in seconds between consecutive attempts.
    #[serde(default = "default_retry_intervals")]
    pub retry_intervals_seconds: Vec<u64>,
    /// How long finished job records are retained, in seconds.
    #[serde(default = "default_ttl")]
    pub result_ttl_seconds: u64,
    /// How long failed job records are retained, in seconds.
    #[serde(default = "default_ttl")]
    pub failure_ttl_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            name: default_queue_name(),
            key_prefix: default_key_prefix(),
            retry_max_attempts: default_retry_max(),
            retry_intervals_seconds: default_retry_intervals(),
            result_ttl_seconds: default_ttl(),
            failure_ttl_seconds: default_ttl(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_queue_name() -> String {
    "cutout".to_string()
}

fn default_key_prefix() -> String {
    "cutout".to_string()
}

fn default_retry_max() -> u32 {
    2
}

fn default_retry_intervals() -> Vec<u64> {
    vec![5, 20]
}

fn default_ttl() -> u64 {
    86_400
}
