//! Source loader abstraction trait

use async_trait::async_trait;
use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;

/// Source loading errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid location: {0}")]
    InvalidKey(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for source operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for lqip_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(location) => lqip_core::AppError::NotFound(location),
            StorageError::InvalidKey(msg) => lqip_core::AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => lqip_core::AppError::Config(msg),
            other => lqip_core::AppError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBackend {
    Local,
    Remote,
}

impl fmt::Display for SourceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceBackend::Local => write!(f, "local"),
            SourceBackend::Remote => write!(f, "remote"),
        }
    }
}

/// Reads the raw bytes of a source image.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Load the file at `location`, relative to the uploads base.
    async fn load(&self, location: &str) -> StorageResult<Vec<u8>>;

    /// Get the backend type
    fn backend_type(&self) -> SourceBackend;
}

/// Reject locations that could escape the uploads base.
pub(crate) fn validate_location(location: &str) -> StorageResult<()> {
    if location.is_empty() {
        return Err(StorageError::InvalidKey("Location is empty".to_string()));
    }
    if location.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Location contains a backslash: {}",
            location
        )));
    }
    let escapes = Path::new(location).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(StorageError::InvalidKey(format!(
            "Location escapes the uploads base: {}",
            location
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_location_rules() {
        assert!(validate_location("2024/05/a.jpg").is_ok());
        assert!(validate_location("a.jpg").is_ok());
        assert!(validate_location("").is_err());
        assert!(validate_location("/etc/passwd").is_err());
        assert!(validate_location("2024/../../secret").is_err());
        assert!(validate_location("2024\\a.jpg").is_err());
    }

    #[test]
    fn double_dots_inside_a_file_name_are_allowed() {
        assert!(validate_location("2024/05/photo..final.jpg").is_ok());
        assert!(validate_location("2024/05/..hidden.png").is_ok());
        assert!(validate_location("2024/05/../../x.png").is_err());
        assert!(validate_location("..").is_err());
    }

    #[test]
    fn storage_errors_map_to_app_errors() {
        let err: lqip_core::AppError = StorageError::NotFound("a.jpg".to_string()).into();
        assert!(matches!(err, lqip_core::AppError::NotFound(_)));

        let err: lqip_core::AppError = StorageError::Timeout("slow".to_string()).into();
        assert!(err.is_recoverable());
    }
}
