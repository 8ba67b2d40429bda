//! Consign Core Library
//!
//! This crate provides the domain model, error types, configuration, validation
//! and notification composition shared by the intake service components.

pub mod config;
pub mod error;
pub mod models;
pub mod notification;
pub mod tracking;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IntakeSettings, MailConfig, NotifyTransport};
pub use error::{
    AppError, ErrorMetadata, IntakeError, LogLevel, UploadError, ValidationError,
};
pub use models::{FileUpload, Submission, UploadStatus};
pub use notification::NotificationEmail;
pub use tracking::{IdentifierGenerator, TimestampIdentifierGenerator, TrackingId};
