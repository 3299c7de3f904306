//! Retry policy attached to each submission.

use serde::{Deserialize, Serialize};

/// Backoff schedule applied by the queue runtime between failed attempts.
///
/// `max_attempts` is the number of retries granted after the first failed
/// execution. `intervals_seconds` are applied in order; when retries outrun
/// the list, the last interval repeats. Immutable once the job is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the first failure.
    pub max_attempts: u32,
    /// Delays in seconds between consecutive attempts.
    pub intervals_seconds: Vec<u64>,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, intervals_seconds: Vec<u64>) -> Self {
        Self {
            max_attempts,
            intervals_seconds,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Vec::new())
    }

    /// Delay before retry number `retry_index` (0-based). The last interval
    /// repeats past the end of the list; an empty list means no delay.
    pub fn interval_for(&self, retry_index: u32) -> u64 {
        match self.intervals_seconds.len() {
            0 => 0,
            len => {
                let idx = (retry_index as usize).min(len - 1);
                self.intervals_seconds[idx]
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, vec![5, 20])
    }
}
