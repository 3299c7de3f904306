//! # cutout-storage
//!
//! Object storage implementations of the
//! [`ObjectStorage`](cutout_core::traits::ObjectStorage) capability:
//! S3-compatible (MinIO in development) and in-memory for tests.

pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStorage;
pub use s3::S3ObjectStorage;
