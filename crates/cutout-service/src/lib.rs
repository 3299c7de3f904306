pub mod removal;
pub mod remover;
pub mod status;
pub mod submission;
pub mod validation;

pub use removal::RemovalService;
pub use remover::HttpBackgroundRemover;
pub use status::{JobStatusPayload, StatusService};
pub use submission::{SubmissionService, Upload};
pub use validation::{validate_image_bytes, ImageInfo};
