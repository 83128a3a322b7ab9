//! Artifact store setup

use anyhow::{Context, Result};
use docpress_core::Config;
use docpress_storage::{create_artifact_store, create_fallback_store, ArtifactStore};
use std::sync::Arc;

/// Primary store plus the optional local fallback.
pub struct Stores {
    pub primary: Arc<dyn ArtifactStore>,
    pub fallback: Option<Arc<dyn ArtifactStore>>,
}

pub async fn setup_storage(config: &Config) -> Result<Stores> {
    tracing::info!("Initializing artifact store...");
    let primary = create_artifact_store(config)
        .await
        .context("Failed to initialize artifact store")?;
    let fallback = create_fallback_store(config)
        .await
        .context("Failed to initialize fallback store")?;

    tracing::info!(
        backend = %primary.backend_type(),
        fallback = fallback.is_some(),
        prefix = %config.storage().artifact_prefix,
        "Artifact store initialized"
    );

    Ok(Stores { primary, fallback })
}
