//! Consign Storage Library
//!
//! Placement of received primary images. The [`UploadStore`] trait abstracts the
//! destination; [`LocalUploadStore`] moves spooled uploads into a directory on
//! the local filesystem.
//!
//! # Filename rules
//!
//! Stored filenames are a single path component: no separators, no `..`, not
//! empty. Anything else is rejected with [`StorageError::InvalidFilename`].

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalUploadStore;
pub use traits::{StorageError, StorageResult, UploadStore};
