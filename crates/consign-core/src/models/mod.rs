//! Request-scoped domain models.

mod submission;
mod upload;

pub use submission::{Submission, FILE_FIELD, REQUIRED_FIELDS};
pub use upload::{FileUpload, UploadStatus};
