//! Docpress Core Library
//!
//! This crate provides the domain models, error taxonomy, and configuration
//! shared by every docpress component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    BaseConfig, Config, ConverterConfig, LedgerSettings, RendererSettings, StorageSettings,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ConversionJob, FileType, JobNaming, JobResult, StagedFileInfo, UploadedFile, UserContext,
    UserRole,
};
pub use storage_types::{LedgerBackend, RenderPoolMode, StorageBackend, StoreFailurePolicy};
