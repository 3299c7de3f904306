//! Job entity and its supporting types.

pub mod model;
pub mod payload;
pub mod retry;
pub mod status;
