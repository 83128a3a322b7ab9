use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Artifact store backend types
///
/// Defined in core because configuration selects it and the storage factory
/// consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Job ledger backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Postgres,
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(LedgerBackend::Postgres),
            "memory" => Ok(LedgerBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid ledger backend: {}", s)),
        }
    }
}

impl Display for LedgerBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LedgerBackend::Postgres => write!(f, "postgres"),
            LedgerBackend::Memory => write!(f, "memory"),
        }
    }
}

/// What the orchestrator does when the primary artifact store rejects a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Abort the conversion with `StoreUnavailable`.
    #[default]
    Fail,
    /// Write the PDF to the local fallback store instead.
    LocalFallback,
}

impl FromStr for StoreFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(StoreFailurePolicy::Fail),
            "local-fallback" | "local_fallback" => Ok(StoreFailurePolicy::LocalFallback),
            _ => Err(anyhow::anyhow!("Invalid store failure policy: {}", s)),
        }
    }
}

impl Display for StoreFailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreFailurePolicy::Fail => write!(f, "fail"),
            StoreFailurePolicy::LocalFallback => write!(f, "local-fallback"),
        }
    }
}

/// Renderer lifecycle: a fresh browser per request, or a set of warm ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPoolMode {
    OneShot,
    Pooled { max_idle: usize },
}

impl Display for RenderPoolMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RenderPoolMode::OneShot => write!(f, "oneshot"),
            RenderPoolMode::Pooled { max_idle } => write!(f, "pooled(max_idle={})", max_idle),
        }
    }
}
