use bytes::Bytes;
use docpress_core::constants::PDF_CONTENT_TYPE;
use docpress_core::models::download_reference;
use docpress_core::{AppError, Config};
use docpress_storage::{ArtifactKeys, ArtifactStore, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;

/// Where a freshly rendered PDF ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub key: String,
    pub download_url: String,
    /// Written to the local fallback store after the primary refused it
    pub in_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub expires_in_seconds: u64,
}

/// Writes rendered PDFs and resolves them back to time-limited links.
pub struct ArtifactService {
    primary: Arc<dyn ArtifactStore>,
    fallback: Option<Arc<dyn ArtifactStore>>,
    keys: ArtifactKeys,
    presign_ttl: Duration,
}

impl ArtifactService {
    pub fn new(
        primary: Arc<dyn ArtifactStore>,
        fallback: Option<Arc<dyn ArtifactStore>>,
        keys: ArtifactKeys,
        presign_ttl: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            keys,
            presign_ttl,
        }
    }

    pub fn from_config(
        config: &Config,
        primary: Arc<dyn ArtifactStore>,
        fallback: Option<Arc<dyn ArtifactStore>>,
    ) -> Self {
        let storage = config.storage();
        Self::new(
            primary,
            fallback,
            ArtifactKeys::new(storage.artifact_prefix.clone()),
            Duration::from_secs(storage.presign_ttl_seconds),
        )
    }

    pub fn keys(&self) -> &ArtifactKeys {
        &self.keys
    }

    pub fn presign_ttl(&self) -> Duration {
        self.presign_ttl
    }

    async fn put_and_presign(
        &self,
        store: &dyn ArtifactStore,
        key: &str,
        pdf: Bytes,
    ) -> StorageResult<String> {
        store.put(key, pdf, PDF_CONTENT_TYPE).await?;
        store.presign_get(key, self.presign_ttl).await
    }

    /// Store a PDF under `file_name` and mint its download link.
    ///
    /// A failed write falls through to the local fallback store when one is
    /// configured; otherwise it is returned as-is. Once the primary holds the
    /// PDF it is never written again: if only signing fails, the link is the
    /// stable download reference instead.
    pub async fn store_pdf(&self, file_name: &str, pdf: Bytes) -> StorageResult<StoredArtifact> {
        let key = self.keys.key_for(file_name)?;

        let primary_error = match self
            .primary
            .put(&key, pdf.clone(), PDF_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                let download_url = match self.primary.presign_get(&key, self.presign_ttl).await {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            key = %key,
                            backend = %self.primary.backend_type(),
                            "Artifact stored but presigning failed, returning download reference"
                        );
                        download_reference(file_name)
                    }
                };
                return Ok(StoredArtifact {
                    key,
                    download_url,
                    in_fallback: false,
                });
            }
            Err(err) => err,
        };

        let fallback = match &self.fallback {
            Some(fallback) if !primary_error.is_client_error() => fallback,
            _ => {
                tracing::error!(
                    error = %primary_error,
                    key = %key,
                    backend = %self.primary.backend_type(),
                    "Failed to store artifact"
                );
                return Err(primary_error);
            }
        };

        tracing::warn!(
            error = %primary_error,
            key = %key,
            backend = %self.primary.backend_type(),
            "Primary artifact store failed, writing to local fallback"
        );

        let download_url = self.put_and_presign(fallback.as_ref(), &key, pdf).await?;
        Ok(StoredArtifact {
            key,
            download_url,
            in_fallback: true,
        })
    }

    /// Resolve an artifact file name to a fresh link from whichever store
    /// holds it. Ownership is checked by the caller.
    ///
    /// A store that errors is skipped so that fallback copies stay reachable
    /// while the primary is down; the error is returned only when no store
    /// could answer.
    pub async fn resolve_download(&self, file_name: &str) -> Result<DownloadLink, AppError> {
        let not_found = || AppError::NotFound("File not found".to_string());
        let key = self.keys.key_for(file_name).map_err(|_| not_found())?;

        let mut stores: Vec<&Arc<dyn ArtifactStore>> = vec![&self.primary];
        stores.extend(self.fallback.iter());

        let mut lookup_error = None;
        let mut answered = false;
        for store in stores {
            match store.exists(&key).await {
                Ok(true) => {
                    let url = store.presign_get(&key, self.presign_ttl).await?;
                    return Ok(DownloadLink {
                        url,
                        expires_in_seconds: self.presign_ttl.as_secs(),
                    });
                }
                Ok(false) => answered = true,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        key = %key,
                        backend = %store.backend_type(),
                        "Artifact lookup failed, trying next store"
                    );
                    lookup_error.get_or_insert(e);
                }
            }
        }

        match lookup_error {
            Some(e) if !answered => Err(e.into()),
            _ => Err(not_found()),
        }
    }

    /// Read an artifact by key from whichever store holds it.
    pub async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let primary_error = match self.primary.get(key).await {
            Ok(data) => return Ok(data),
            Err(e) => e,
        };
        let Some(fallback) = &self.fallback else {
            return Err(primary_error);
        };
        if !matches!(primary_error, StorageError::NotFound(_)) {
            tracing::warn!(error = %primary_error, key = %key, "Primary read failed, trying fallback");
        }
        fallback.get(key).await
    }
}
