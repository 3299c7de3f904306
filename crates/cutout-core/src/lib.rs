//! # cutout-core
//!
//! Core crate for Cutout. Contains configuration schemas, capability traits,
//! the process-wide metrics store, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Cutout crates.

pub mod config;
pub mod error;
pub mod metrics;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
