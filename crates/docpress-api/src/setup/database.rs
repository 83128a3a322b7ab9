//! Database setup for the Postgres job ledger

use anyhow::{Context, Result};
use docpress_core::{Config, LedgerBackend};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Connect and migrate when the Postgres ledger is selected; `None` otherwise.
pub async fn setup_database(config: &Config) -> Result<Option<PgPool>> {
    let settings = config.ledger();
    if settings.backend != LedgerBackend::Postgres {
        return Ok(None);
    }

    let url = settings
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when using the postgres ledger")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(settings.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = settings.db_max_connections,
        "Database connected successfully"
    );

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
