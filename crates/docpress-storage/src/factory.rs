#[cfg(feature = "storage-local")]
use crate::LocalStore;
#[cfg(feature = "storage-s3")]
use crate::S3Store;
use crate::{ArtifactStore, StorageBackend, StorageError, StorageResult};
use docpress_core::{Config, StoreFailurePolicy};
use std::sync::Arc;

/// Create the primary artifact store based on configuration
pub async fn create_artifact_store(config: &Config) -> StorageResult<Arc<dyn ArtifactStore>> {
    let settings = config.storage();

    match settings.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = settings
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = settings
                .s3_region
                .clone()
                .or_else(|| settings.aws_region.clone())
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;

            let store = S3Store::new(bucket, region, settings.s3_endpoint.clone())?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let store = LocalStore::new(
                settings.local_storage_path.clone(),
                settings.local_storage_base_url.clone(),
                settings.link_signing_secret.as_bytes(),
            )
            .await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the local store used when the primary store rejects a write.
///
/// Returns `None` unless `STORE_FAILURE_POLICY=local-fallback`. Fallback
/// artifacts are served from the same base URL as local primary artifacts.
#[cfg(feature = "storage-local")]
pub async fn create_fallback_store(
    config: &Config,
) -> StorageResult<Option<Arc<dyn ArtifactStore>>> {
    let settings = config.storage();
    if settings.store_failure_policy != StoreFailurePolicy::LocalFallback {
        return Ok(None);
    }

    let store = LocalStore::new(
        settings.local_fallback_path.clone(),
        settings.local_storage_base_url.clone(),
        settings.link_signing_secret.as_bytes(),
    )
    .await?;
    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "storage-local"))]
pub async fn create_fallback_store(
    config: &Config,
) -> StorageResult<Option<Arc<dyn ArtifactStore>>> {
    if config.storage().store_failure_policy == StoreFailurePolicy::LocalFallback {
        return Err(StorageError::ConfigError(
            "local-fallback requires the storage-local feature".to_string(),
        ));
    }
    Ok(None)
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use docpress_core::ConverterConfig;

    #[tokio::test]
    async fn test_local_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut inner = ConverterConfig::default();
        inner.storage.local_storage_path = dir.path().join("artifacts");
        let config = Config::from(inner);

        let store = create_artifact_store(&config).await.unwrap();
        assert_eq!(store.backend_type(), StorageBackend::Local);
        assert!(create_fallback_store(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fallback_store_only_with_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut inner = ConverterConfig::default();
        inner.storage.store_failure_policy = StoreFailurePolicy::LocalFallback;
        inner.storage.local_fallback_path = dir.path().join("fallback");
        let config = Config::from(inner);

        let fallback = create_fallback_store(&config).await.unwrap();
        assert!(fallback.is_some());
        assert!(dir.path().join("fallback").is_dir());
    }
}
