use crate::traits::{StorageError, StorageResult, UploadStore};
use async_trait::async_trait;
use consign_core::IntakeSettings;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem upload store
#[derive(Clone, Debug)]
pub struct LocalUploadStore {
    base_path: PathBuf,
    dir_mode: u32,
}

impl LocalUploadStore {
    /// Create a new LocalUploadStore instance
    ///
    /// Nothing is touched on disk until [`UploadStore::ensure_ready`] runs.
    ///
    /// # Arguments
    /// * `base_path` - Destination directory (e.g., "secure_uploads")
    /// * `dir_mode` - Unix permission bits used when the directory is created
    pub fn new(base_path: impl Into<PathBuf>, dir_mode: u32) -> Self {
        LocalUploadStore {
            base_path: base_path.into(),
            dir_mode,
        }
    }

    pub fn from_settings(settings: &IntakeSettings) -> Self {
        Self::new(settings.upload_dir.clone(), settings.upload_dir_mode)
    }

    /// Resolve a stored filename with path traversal validation
    fn filename_to_path(&self, filename: &str) -> StorageResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        Ok(self.base_path.join(filename))
    }

    async fn create_dir(&self) -> std::io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.dir_mode);
        builder.create(&self.base_path).await
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn ensure_ready(&self) -> StorageResult<()> {
        if fs::try_exists(&self.base_path).await.unwrap_or(false) {
            return Ok(());
        }

        self.create_dir().await.map_err(|e| {
            StorageError::DirectoryUnavailable(format!(
                "Failed to create upload directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %self.base_path.display(),
            mode = format_args!("{:o}", self.dir_mode),
            "Upload directory created"
        );

        Ok(())
    }

    async fn store(&self, temp_path: &Path, filename: &str) -> StorageResult<PathBuf> {
        let path = self.filename_to_path(filename)?;
        let start = std::time::Instant::now();

        if let Err(rename_err) = fs::rename(temp_path, &path).await {
            // rename(2) cannot cross filesystems; fall back to copy + unlink.
            if !fs::try_exists(temp_path).await.unwrap_or(false) {
                return Err(StorageError::MoveFailed(format!(
                    "Failed to move {} to {}: {}",
                    temp_path.display(),
                    path.display(),
                    rename_err
                )));
            }

            fs::copy(temp_path, &path).await.map_err(|e| {
                StorageError::MoveFailed(format!(
                    "Failed to copy {} to {}: {}",
                    temp_path.display(),
                    path.display(),
                    e
                ))
            })?;

            if let Err(e) = fs::remove_file(temp_path).await {
                tracing::warn!(
                    error = %e,
                    temp_path = %temp_path.display(),
                    "Failed to remove spooled upload after copy"
                );
            }
        }

        tracing::info!(
            path = %path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload store move successful"
        );

        Ok(path)
    }

    fn root(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn spooled(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_ensure_ready_creates_nested_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a").join("secure_uploads");
        let store = LocalUploadStore::new(&target, 0o755);

        store.ensure_ready().await.unwrap();
        assert!(target.is_dir());

        // Second call is a no-op
        store.ensure_ready().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_ready_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let target = dir.path().join("private");
        let store = LocalUploadStore::new(&target, 0o700);
        store.ensure_ready().await.unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_ensure_ready_reports_blocked_path() {
        let dir = tempdir().unwrap();
        let blocker = spooled(dir.path(), "not-a-dir", b"x").await;
        let store = LocalUploadStore::new(blocker.join("uploads"), 0o755);

        let result = store.ensure_ready().await;
        assert!(matches!(result, Err(StorageError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_store_moves_file() {
        let spool = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let temp = spooled(spool.path(), "upload-1", b"image bytes").await;
        let store = LocalUploadStore::new(dest.path(), 0o755);

        let stored = store.store(&temp, "OPC-1_Ana_PRIMARY.png").await.unwrap();

        assert_eq!(stored, dest.path().join("OPC-1_Ana_PRIMARY.png"));
        assert_eq!(fs::read(&stored).await.unwrap(), b"image bytes");
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_store_replaces_same_name() {
        let dir = tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), 0o755);

        let first = spooled(dir.path(), "first", b"one").await;
        store.store(&first, "same.png").await.unwrap();
        let second = spooled(dir.path(), "second", b"two").await;
        let stored = store.store(&second, "same.png").await.unwrap();

        assert_eq!(fs::read(&stored).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_store_missing_source_fails() {
        let dir = tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), 0o755);

        let result = store.store(&dir.path().join("gone"), "x.png").await;
        assert!(matches!(result, Err(StorageError::MoveFailed(_))));
    }

    #[tokio::test]
    async fn test_store_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let temp = spooled(dir.path(), "upload", b"data").await;
        let store = LocalUploadStore::new(dir.path().join("never-created"), 0o755);

        let result = store.store(&temp, "x.png").await;
        assert!(matches!(result, Err(StorageError::MoveFailed(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path(), 0o755);
        let temp = spooled(dir.path(), "upload", b"data").await;

        for name in ["../escape.png", "a/b.png", "a\\b.png", ""] {
            let result = store.store(&temp, name).await;
            assert!(
                matches!(result, Err(StorageError::InvalidFilename(_))),
                "{} should be rejected",
                name
            );
        }
    }
}
