//! Job ledger trait and backends

mod memory;
mod postgres;

pub use memory::MemoryJobLedger;
pub use postgres::PgJobLedger;

use docpress_core::{AppError, Config, ConversionJob, LedgerBackend};
use sqlx::PgPool;
use std::sync::Arc;

/// Ledger operation errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt ledger row: {0}")]
    CorruptRow(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err.to_string())
    }
}

/// Two-key job store: partition key (`owner_key`) plus sort key (`job_id`).
///
/// Listings are ordered by `created_at`, newest first.
#[async_trait::async_trait]
pub trait JobLedger: Send + Sync {
    /// Insert a job. A colliding `(owner_key, job_id)` overwrites the earlier entry.
    async fn append(&self, job: &ConversionJob) -> LedgerResult<()>;

    /// Jobs in one partition whose `user_name` matches.
    async fn query_by_owner(
        &self,
        owner_key: &str,
        user_name: &str,
    ) -> LedgerResult<Vec<ConversionJob>>;

    /// Every job in every partition. Administrative; unindexed.
    async fn scan_all(&self) -> LedgerResult<Vec<ConversionJob>>;

    fn backend(&self) -> LedgerBackend;
}

/// Build the configured ledger. A pool is required for the postgres backend.
pub fn create_job_ledger(
    config: &Config,
    pool: Option<PgPool>,
) -> Result<Arc<dyn JobLedger>, AppError> {
    match config.ledger().backend {
        LedgerBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("postgres ledger selected but no pool was provided".to_string())
            })?;
            tracing::info!("Initializing PostgreSQL job ledger");
            Ok(Arc::new(PgJobLedger::new(pool)))
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory job ledger; jobs are lost on restart");
            Ok(Arc::new(MemoryJobLedger::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpress_core::ConverterConfig;

    #[test]
    fn test_factory_memory_backend() {
        let config = Config::from(ConverterConfig::default());
        let ledger = create_job_ledger(&config, None).unwrap();
        assert_eq!(ledger.backend(), LedgerBackend::Memory);
    }

    #[test]
    fn test_factory_postgres_requires_pool() {
        let mut inner = ConverterConfig::default();
        inner.ledger.backend = LedgerBackend::Postgres;
        inner.ledger.database_url = Some("postgres://localhost/docpress".to_string());
        let config = Config::from(inner);
        assert!(create_job_ledger(&config, None).is_err());
    }
}
