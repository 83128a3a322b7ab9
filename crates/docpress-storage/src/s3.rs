use crate::keys::validate_key;
use crate::traits::{ArtifactStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};
use std::time::Duration;

/// S3 artifact store
#[derive(Clone)]
pub struct S3Store {
    store: AmazonS3,
    bucket: String,
}

impl S3Store {
    /// Build a store for `bucket`. `endpoint_url` points at an S3-compatible
    /// service such as MinIO; plain `http://` endpoints are allowed.
    /// Credentials are read from the standard AWS environment variables.
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Store { store, bucket })
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        let size_bytes = data.len();
        let started = std::time::Instant::now();

        if let Err(e) = self
            .store
            .put(&Path::from(key.to_string()), PutPayload::from(data))
            .await
        {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key,
                size_bytes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Artifact upload to bucket failed"
            );
            return Err(StorageError::UploadFailed(e.to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key,
            size_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Artifact uploaded to bucket"
        );
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        self.store
            .signed_url(Method::GET, &location, ttl)
            .await
            .map(|url| url.to_string())
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        let started = std::time::Instant::now();

        let object = match self.store.get(&Path::from(key.to_string())).await {
            Ok(object) => object,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key, "Artifact fetch from bucket failed");
                return Err(StorageError::DownloadFailed(e.to_string()));
            }
        };
        let bytes = object
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key,
            size_bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Artifact fetched from bucket"
        );
        Ok(bytes)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
