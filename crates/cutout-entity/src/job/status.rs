//! Job status and kind enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a background job.
///
/// Transitions are monotone toward a terminal state; the only backward edge
/// is Started → Queued, taken exclusively by the queue runtime when it
/// re-queues a failed attempt for retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting in the queue for a worker.
    Queued,
    /// Currently being processed by a worker.
    Started,
    /// Successfully completed.
    Finished,
    /// Failed after all retry attempts.
    Failed,
    /// Cancelled before a worker picked it up.
    Canceled,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Canceled)
    }

    /// Check if the job can be re-submitted by a client.
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of work a job carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// One image in, one PNG out.
    Single,
    /// Several images in, one zip archive out.
    Batch,
    /// Storage garbage collection.
    Cleanup,
}

impl JobKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batch => "batch",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
