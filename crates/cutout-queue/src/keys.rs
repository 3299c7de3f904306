//! Redis key builders for all queue entries.
//!
//! Centralising key construction prevents typos and makes it easy to find
//! every key the queue uses.

use uuid::Uuid;

/// Key holding the JSON record of a job.
pub fn job(prefix: &str, id: Uuid) -> String {
    format!("{prefix}:job:{id}")
}

/// List of job ids ready for dequeue.
pub fn ready(prefix: &str, queue: &str) -> String {
    format!("{prefix}:queue:{queue}")
}

/// Sorted set of job ids scheduled for retry, scored by due time.
pub fn scheduled(prefix: &str, queue: &str) -> String {
    format!("{prefix}:queue:{queue}:scheduled")
}

/// Counter of jobs currently held by workers.
pub fn started_count(prefix: &str) -> String {
    format!("{prefix}:stats:started")
}

/// Counter of terminally failed jobs.
pub fn failed_count(prefix: &str) -> String {
    format!("{prefix}:stats:failed")
}
