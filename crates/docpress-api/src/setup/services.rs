//! Service wiring and application state

use super::storage::Stores;
use crate::state::AppState;
use anyhow::{Context, Result};
use docpress_core::Config;
use docpress_db::create_job_ledger;
use docpress_processing::{RendererPool, UploadValidator};
use docpress_services::{ArtifactService, ConversionService, JobService, UploadStaging};
use sqlx::PgPool;
use std::sync::Arc;

/// Build the renderer pool around headless Chrome.
#[cfg(feature = "chrome")]
pub fn setup_renderer(config: &Config) -> Result<RendererPool> {
    let settings = config.renderer();
    let factory = docpress_processing::ChromeBrowserFactory::from_settings(settings);
    Ok(RendererPool::from_settings(Arc::new(factory), settings))
}

#[cfg(not(feature = "chrome"))]
pub fn setup_renderer(_config: &Config) -> Result<RendererPool> {
    anyhow::bail!("docpress-api was built without the chrome feature; no PDF renderer available")
}

/// Wire the services into the application state.
pub fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    stores: Stores,
    renderer: RendererPool,
) -> Result<Arc<AppState>> {
    let ledger = create_job_ledger(config, pool).context("Failed to initialize job ledger")?;
    let ledger_backend = ledger.backend();
    let storage_backend = stores.primary.backend_type();

    let staging = Arc::new(UploadStaging::new());
    let artifacts = Arc::new(ArtifactService::from_config(
        config,
        stores.primary,
        stores.fallback,
    ));
    let jobs = Arc::new(JobService::from_config(config, ledger));
    let conversions =
        ConversionService::new(staging.clone(), renderer, artifacts.clone(), jobs.clone());

    tracing::info!(
        ledger = %ledger_backend,
        storage = %storage_backend,
        max_upload_bytes = config.max_upload_size_bytes(),
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        staging,
        validator: UploadValidator::new(config.max_upload_size_bytes() as u64),
        conversions,
        artifacts,
        jobs,
        storage_backend,
        ledger_backend,
    }))
}
