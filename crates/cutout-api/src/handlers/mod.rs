pub mod admin;
pub mod health;
pub mod jobs;
pub mod sync;

pub(crate) mod multipart;
