//! Conversion orchestrator: staged upload -> HTML -> PDF -> artifact store
//! -> job ledger.

use crate::artifacts::{ArtifactService, DownloadLink, StoredArtifact};
use crate::jobs::{JobService, RecordOutcome};
use crate::staging::UploadStaging;
use chrono::Utc;
use docpress_core::models::{file_extension, pdf_file_name};
use docpress_core::{AppError, ConversionJob, FileType, JobNaming, JobResult, UserContext};
use docpress_processing::adapters::render_html;
use docpress_processing::{AdapterError, RenderError, RendererPool};
use docpress_storage::StorageError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Where a conversion is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Idle,
    Staged,
    Rendering,
    Uploading,
    Recording,
    Done,
    Failed,
}

impl ConversionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStage::Idle => "idle",
            ConversionStage::Staged => "staged",
            ConversionStage::Rendering => "rendering",
            ConversionStage::Uploading => "uploading",
            ConversionStage::Recording => "recording",
            ConversionStage::Done => "done",
            ConversionStage::Failed => "failed",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("No file staged for conversion")]
    NoFileStaged,

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StorageError),
}

impl ConversionError {
    /// Stage the failure happened in.
    pub fn stage(&self) -> ConversionStage {
        match self {
            ConversionError::NoFileStaged => ConversionStage::Idle,
            ConversionError::UnsupportedFormat(_) => ConversionStage::Staged,
            ConversionError::Adapter(_) | ConversionError::Render(_) => ConversionStage::Rendering,
            ConversionError::Store(_) => ConversionStage::Uploading,
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::NoFileStaged => AppError::NoFileStaged,
            ConversionError::UnsupportedFormat(file_type) => AppError::UnsupportedFormat(file_type),
            ConversionError::Adapter(e) => e.into(),
            ConversionError::Render(e) => e.into(),
            ConversionError::Store(e) => AppError::StoreUnavailable(e.to_string()),
        }
    }
}

/// Result of a completed conversion.
#[derive(Debug, Clone)]
pub struct ConversionReceipt {
    pub job: ConversionJob,
    /// Time-limited link to the stored PDF
    pub download_url: String,
    pub stored_in_fallback: bool,
    pub ledger: RecordOutcome,
}

/// Runs one conversion per call; calls for different users proceed
/// concurrently and share nothing but the staging map.
pub struct ConversionService {
    staging: Arc<UploadStaging>,
    renderer: RendererPool,
    artifacts: Arc<ArtifactService>,
    jobs: Arc<JobService>,
}

impl ConversionService {
    pub fn new(
        staging: Arc<UploadStaging>,
        renderer: RendererPool,
        artifacts: Arc<ArtifactService>,
        jobs: Arc<JobService>,
    ) -> Self {
        Self {
            staging,
            renderer,
            artifacts,
            jobs,
        }
    }

    pub fn renderer(&self) -> &RendererPool {
        &self.renderer
    }

    /// Resolve an artifact to a fresh link for `user`.
    ///
    /// Non-admins must own a ledger entry referencing the artifact; anything
    /// else is reported as missing.
    pub async fn resolve_download(
        &self,
        user: &UserContext,
        file_name: &str,
    ) -> Result<DownloadLink, AppError> {
        if !user.is_admin() && !self.jobs.owns_artifact(user, file_name).await? {
            tracing::debug!(user = %user.user_name, file_name, "Download refused, no matching job");
            return Err(AppError::NotFound("File not found".to_string()));
        }
        self.artifacts.resolve_download(file_name).await
    }

    /// Convert the caller's staged upload.
    ///
    /// The staged file is consumed even when the conversion fails. Only
    /// successful conversions are recorded; a ledger outage does not fail
    /// the call once the PDF is stored.
    pub async fn convert(&self, user: &UserContext) -> Result<ConversionReceipt, ConversionError> {
        let started = Instant::now();

        let Some(file) = self.staging.take(user.staging_key()).await else {
            tracing::info!(user = %user.user_name, "Convert requested with nothing staged");
            return Err(ConversionError::NoFileStaged);
        };

        let Some(file_type) = file.file_type() else {
            let extension = file_extension(&file.file_name).unwrap_or_default();
            tracing::warn!(
                user = %user.user_name,
                file_name = %file.file_name,
                stage = %ConversionStage::Failed,
                "Staged file has an unsupported type"
            );
            return Err(ConversionError::UnsupportedFormat(extension));
        };

        let naming = JobNaming::new(
            &user.user_name,
            file_type,
            Utc::now().timestamp_millis(),
            random_suffix(),
        );
        let job_id = naming.job_id();

        let span = tracing::info_span!(
            "conversion",
            job_id = %job_id,
            user = %user.user_name,
            file_type = %file_type
        );

        async move {
            let result = self
                .run(user, &file.file_name, file_type, file.content, &naming, started)
                .await;

            if let Err(e) = &result {
                tracing::warn!(
                    error = %e,
                    failed_stage = %e.stage(),
                    stage = %ConversionStage::Failed,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Conversion failed"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        user: &UserContext,
        original_file_name: &str,
        file_type: FileType,
        content: bytes::Bytes,
        naming: &JobNaming,
        started: Instant,
    ) -> Result<ConversionReceipt, ConversionError> {
        let original_size_bytes = content.len() as u64;
        log_stage(ConversionStage::Rendering, started);

        let document = render_html(file_type, content).await?;
        let pdf = self.renderer.render(&document.html).await?;
        let output_size_bytes = pdf.len() as u64;

        log_stage(ConversionStage::Uploading, started);
        let StoredArtifact {
            download_url,
            in_fallback,
            ..
        } = self
            .artifacts
            .store_pdf(&naming.artifact_file_name(), pdf)
            .await?;

        log_stage(ConversionStage::Recording, started);
        let job = ConversionJob {
            job_id: naming.job_id(),
            owner_key: self.jobs.partition_key().to_string(),
            user_name: user.user_name.clone(),
            full_name: user.full_name.clone(),
            original_file_name: original_file_name.to_string(),
            converted_file_name: pdf_file_name(original_file_name),
            file_type,
            result: JobResult::Success,
            created_at: Utc::now(),
            original_size_bytes,
            output_size_bytes,
            download_reference: naming.download_reference(),
        };
        let ledger = self.jobs.record(&job).await;

        tracing::info!(
            stage = %ConversionStage::Done,
            duration_ms = started.elapsed().as_millis() as u64,
            size_bytes = output_size_bytes,
            in_fallback = in_fallback,
            ledger = ?ledger,
            "Conversion complete"
        );

        Ok(ConversionReceipt {
            job,
            download_url,
            stored_in_fallback: in_fallback,
            ledger,
        })
    }
}

fn log_stage(stage: ConversionStage, started: Instant) {
    tracing::info!(
        stage = %stage,
        duration_ms = started.elapsed().as_millis() as u64,
        "Conversion stage"
    );
}

/// 8 hex chars appended to job ids and artifact names.
fn random_suffix() -> String {
    hex::encode(rand::random::<[u8; 4]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(random_suffix(), random_suffix());
    }

    #[test]
    fn test_error_stages_and_mapping() {
        assert_eq!(ConversionError::NoFileStaged.stage(), ConversionStage::Idle);
        let render = ConversionError::Render(RenderError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(render.stage(), ConversionStage::Rendering);
        assert!(matches!(AppError::from(render), AppError::RenderTimeout(5)));

        let store = ConversionError::Store(StorageError::UploadFailed("down".to_string()));
        assert_eq!(store.stage(), ConversionStage::Uploading);
        assert!(matches!(AppError::from(store), AppError::StoreUnavailable(_)));
    }
}
