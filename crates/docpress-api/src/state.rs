//! Application state shared by every handler through `State<Arc<AppState>>`.

use docpress_core::{Config, LedgerBackend, StorageBackend};
use docpress_processing::{RendererPool, UploadValidator};
use docpress_services::{ArtifactService, ConversionService, JobService, UploadStaging};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub staging: Arc<UploadStaging>,
    pub validator: UploadValidator,
    pub conversions: ConversionService,
    pub artifacts: Arc<ArtifactService>,
    pub jobs: Arc<JobService>,
    /// Backends in use, reported by the health endpoint
    pub storage_backend: StorageBackend,
    pub ledger_backend: LedgerBackend,
}

impl AppState {
    pub fn renderer(&self) -> &RendererPool {
        self.conversions.renderer()
    }
}
