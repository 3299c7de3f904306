//! Periodic storage cleanup configuration.

use serde::{Deserialize, Serialize};

/// Settings for the cleanup scheduler and the cleanup job it submits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Whether the scheduler loop runs in this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between cleanup submissions. Floored to 60 at runtime.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Objects older than this many seconds are deleted.
    #[serde(default = "default_older_than")]
    pub older_than_seconds: u64,
}

impl CleanupConfig {
    /// Effective scheduler interval: configured value with a 60 second floor.
    pub fn effective_interval_seconds(&self) -> u64 {
        self.interval_seconds.max(60)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_interval(),
            older_than_seconds: default_older_than(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    900
}

fn default_older_than() -> u64 {
    86_400
}
