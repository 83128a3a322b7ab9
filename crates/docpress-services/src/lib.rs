//! Docpress Services Layer
//!
//! Business services that sit between the HTTP handlers and the storage,
//! ledger and rendering crates: per-user upload staging, the conversion
//! orchestrator, artifact resolution and job listing. Handlers in
//! docpress-api stay thin and call into this crate.

pub mod artifacts;
pub mod conversion;
pub mod dead_letter;
pub mod jobs;
pub mod staging;

pub use artifacts::{ArtifactService, DownloadLink, StoredArtifact};
pub use conversion::{ConversionError, ConversionReceipt, ConversionService, ConversionStage};
pub use dead_letter::DeadLetterLog;
pub use jobs::{JobService, RecordOutcome, RetryPolicy};
pub use staging::UploadStaging;
