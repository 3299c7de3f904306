//! # cutout-entity
//!
//! Domain entities for Cutout: the job model, its status machine, the tagged
//! payload variants carried through the durable queue, and the retry policy
//! attached to every submission.

pub mod job;

pub use job::model::{Job, JobMeta, JobResult};
pub use job::payload::{BatchItem, JobPayload, RemovalOptions};
pub use job::retry::RetryPolicy;
pub use job::status::{JobKind, JobStatus};
