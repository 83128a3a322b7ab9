use crate::keys::validate_key;
use crate::link_token;
use crate::traits::{ArtifactStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem artifact store
///
/// "Presigned" links are `{base_url}/{key}?expires={unix}&signature={mac}`.
/// Whoever serves `base_url` must check them with [`link_token::verify`]
/// using the same secret.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
    link_secret: Arc<[u8]>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for artifacts (e.g., "/var/lib/docpress/artifacts")
    /// * `base_url` - Base URL the directory is served under (e.g., "http://localhost:4000/files")
    /// * `link_secret` - HMAC key for download link signatures
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        link_secret: &[u8],
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url,
            link_secret: Arc::from(link_secret),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key to a filesystem path, rejecting anything that could
    /// escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;

        let path = self.base_path.join(key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn generate_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encoded.join("/")
        )
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;
        let start = std::time::Instant::now();

        let write_failed = |step: &str, e: std::io::Error| {
            StorageError::UploadFailed(format!("{} {}: {}", step, path.display(), e))
        };

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| write_failed("create", e))?;
        file.write_all(&data)
            .await
            .map_err(|e| write_failed("write", e))?;
        // A PDF we report as stored must survive a crash.
        file.sync_all().await.map_err(|e| write_failed("sync", e))?;

        tracing::info!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Artifact written to local store"
        );

        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = link_token::sign(&self.link_secret, key, expires)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(format!(
            "{}?expires={}&signature={}",
            self.generate_url(key),
            expires,
            signature
        ))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("read {}: {}", path.display(), e)))?;

        tracing::debug!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Artifact read from local store"
        );

        Ok(Bytes::from(data))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &[u8] = b"local-store-test-secret-0123456789";

    async fn store_in(dir: &Path) -> LocalStore {
        LocalStore::new(dir, "http://localhost:4000/files".to_string(), SECRET)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let data = Bytes::from_static(b"%PDF-1.7 test");
        store
            .put("conversions/alice_md_1_abc.pdf", data.clone(), "application/pdf")
            .await
            .unwrap();

        assert!(store.exists("conversions/alice_md_1_abc.pdf").await.unwrap());
        assert_eq!(store.get("conversions/alice_md_1_abc.pdf").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let result = store.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store
            .put("../escape.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_object() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        assert!(!store.exists("conversions/none.pdf").await.unwrap());
        assert!(matches!(
            store.get("conversions/none.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_presign_get_signs_key_and_expiry() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let before = chrono::Utc::now().timestamp();
        let url = store
            .presign_get("conversions/jane doe.pdf", Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:4000/files/conversions/jane%20doe.pdf?expires="));
        let query = url.split_once('?').unwrap().1;
        let (expires, signature) = query.split_once("&signature=").unwrap();
        let expires: i64 = expires.trim_start_matches("expires=").parse().unwrap();
        assert!(expires >= before + 3600);

        assert!(link_token::verify(SECRET, "conversions/jane doe.pdf", expires, signature).is_ok());
        assert!(link_token::verify(SECRET, "conversions/other.pdf", expires, signature).is_err());
    }
}
