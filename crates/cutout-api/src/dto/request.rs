//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Optional body for a manual cleanup trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupRequest {
    /// Override for the configured artifact age threshold.
    pub older_than_seconds: Option<u64>,
}
