use crate::traits::{validate_location, SourceBackend, SourceLoader, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Reads source images from the uploads directory.
#[derive(Clone, Debug)]
pub struct LocalSource {
    base_path: PathBuf,
}

impl LocalSource {
    /// Create a new LocalSource rooted at `base_path` (the uploads directory).
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Convert a location to a filesystem path with traversal checks.
    ///
    /// Symlinks are allowed only when they resolve inside the base directory.
    fn location_to_path(&self, location: &str) -> StorageResult<PathBuf> {
        validate_location(location)?;

        let path = self.base_path.join(location);

        if let (Ok(base_canonical), Ok(canonical)) =
            (self.base_path.canonicalize(), path.canonicalize())
        {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Location resolves outside uploads directory".to_string(),
                ));
            }
        }

        Ok(path)
    }
}

#[async_trait]
impl SourceLoader for LocalSource {
    async fn load(&self, location: &str) -> StorageResult<Vec<u8>> {
        let path = self.location_to_path(location)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local source read"
        );

        Ok(data)
    }

    fn backend_type(&self) -> SourceBackend {
        SourceBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_file_under_base() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("2024/05")).unwrap();
        std::fs::write(dir.path().join("2024/05/a.jpg"), b"jpeg-bytes").unwrap();

        let source = LocalSource::new(dir.path());
        let data = source.load("2024/05/a.jpg").await.unwrap();
        assert_eq!(data, b"jpeg-bytes");
        assert_eq!(source.backend_type(), SourceBackend::Local);
    }

    #[tokio::test]
    async fn loads_file_with_double_dot_in_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("2024/05")).unwrap();
        std::fs::write(dir.path().join("2024/05/photo..final.jpg"), b"jpeg-bytes").unwrap();

        let source = LocalSource::new(dir.path());
        let data = source.load("2024/05/photo..final.jpg").await.unwrap();
        assert_eq!(data, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path());
        let err = source.load("2024/05/missing.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path());
        let err = source.load("../outside.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escaping_base_is_rejected() {
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.png"), b"secret").unwrap();

        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.png"), dir.path().join("link.png"))
            .unwrap();

        let source = LocalSource::new(dir.path());
        let err = source.load("link.png").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
