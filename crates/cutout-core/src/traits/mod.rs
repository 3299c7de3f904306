//! Capability traits consumed, not implemented, by the orchestration core.

pub mod remover;
pub mod storage;

pub use remover::BackgroundRemover;
pub use storage::{ObjectMeta, ObjectStorage};
