//! Artifact store abstraction trait
//!
//! This module defines the ArtifactStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use docpress_core::AppError;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the failure is about the caller's key rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StorageError::NotFound(_) | StorageError::InvalidKey(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            StorageError::InvalidKey(message) => AppError::BadRequest(message),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home for rendered PDFs.
///
/// `presign_get` never moves bytes: it mints a capability URL that is valid
/// for `ttl`. Keys are built by [`crate::ArtifactKeys`].
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Time-limited GET URL for `key`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Read an object back in full.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
