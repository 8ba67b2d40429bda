//! Upload store abstraction trait
//!
//! This module defines the UploadStore trait that destinations must implement.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for accepted uploads
///
/// The intake pipeline calls [`ensure_ready`](UploadStore::ensure_ready) once per
/// submission and [`store`](UploadStore::store) once the submission validates.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Create the destination (and missing parents) if it does not exist yet.
    async fn ensure_ready(&self) -> StorageResult<()>;

    /// Move the spooled file at `temp_path` into the store under `filename`.
    ///
    /// Returns the stored location as it should be reported to people, i.e. the
    /// configured directory joined with `filename`. An existing file with the
    /// same name is replaced.
    async fn store(&self, temp_path: &Path, filename: &str) -> StorageResult<PathBuf>;

    /// The destination directory
    fn root(&self) -> &Path;
}
