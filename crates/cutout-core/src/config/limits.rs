//! Submission validation and admission-control limits.

use serde::{Deserialize, Serialize};

/// Limits applied before any job is enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted image payload size in bytes (default 12 MiB).
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Maximum accepted decoded pixel count per image.
    #[serde(default = "default_max_image_pixels")]
    pub max_image_pixels: u64,
    /// Maximum number of files in one batch submission.
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: usize,
    /// Sliding-window rate limit per client per minute.
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: usize,
    /// Maximum concurrent invocations of the remover capability.
    #[serde(default = "default_inference_concurrency")]
    pub inference_concurrency: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_image_pixels: default_max_image_pixels(),
            max_batch_files: default_max_batch_files(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            inference_concurrency: default_inference_concurrency(),
        }
    }
}

fn default_max_image_bytes() -> u64 {
    12 * 1024 * 1024
}

fn default_max_image_pixels() -> u64 {
    20_000_000
}

fn default_max_batch_files() -> usize {
    15
}

fn default_rate_limit_per_minute() -> usize {
    45
}

fn default_inference_concurrency() -> usize {
    2
}
