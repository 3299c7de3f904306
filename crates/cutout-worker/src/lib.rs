pub mod executor;
pub mod jobs;
pub mod runner;
pub mod scheduler;

pub use executor::{JobContext, JobExecutor};
pub use runner::WorkerRunner;
pub use scheduler::CleanupScheduler;
