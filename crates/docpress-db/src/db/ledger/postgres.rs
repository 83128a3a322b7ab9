use super::{JobLedger, LedgerError, LedgerResult};
use docpress_core::{ConversionJob, FileType, JobResult, LedgerBackend};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const JOB_COLUMNS: &str = "owner_key, job_id, user_name, full_name, original_file_name, \
     converted_file_name, file_type, result, created_at, original_size_bytes, \
     output_size_bytes, download_reference";

/// Postgres-backed ledger over the `conversion_jobs` table.
#[derive(Clone)]
pub struct PgJobLedger {
    pool: PgPool,
}

impl PgJobLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_job(row: &PgRow) -> LedgerResult<ConversionJob> {
    let file_type: String = row.try_get("file_type")?;
    let result: String = row.try_get("result")?;
    let original_size: i64 = row.try_get("original_size_bytes")?;
    let output_size: i64 = row.try_get("output_size_bytes")?;

    Ok(ConversionJob {
        job_id: row.try_get("job_id")?,
        owner_key: row.try_get("owner_key")?,
        user_name: row.try_get("user_name")?,
        full_name: row.try_get("full_name")?,
        original_file_name: row.try_get("original_file_name")?,
        converted_file_name: row.try_get("converted_file_name")?,
        file_type: file_type
            .parse::<FileType>()
            .map_err(|e| LedgerError::CorruptRow(format!("file_type {}", e)))?,
        result: result.parse::<JobResult>().map_err(LedgerError::CorruptRow)?,
        created_at: row.try_get("created_at")?,
        original_size_bytes: u64::try_from(original_size)
            .map_err(|_| LedgerError::CorruptRow("negative original_size_bytes".to_string()))?,
        output_size_bytes: u64::try_from(output_size)
            .map_err(|_| LedgerError::CorruptRow("negative output_size_bytes".to_string()))?,
        download_reference: row.try_get("download_reference")?,
    })
}

fn size_to_db(size: u64) -> LedgerResult<i64> {
    i64::try_from(size).map_err(|_| LedgerError::CorruptRow(format!("size {} out of range", size)))
}

#[async_trait::async_trait]
impl JobLedger for PgJobLedger {
    #[tracing::instrument(skip(self, job), fields(
        db.system = "postgresql",
        db.table = "conversion_jobs",
        db.operation = "upsert",
        job_id = %job.job_id
    ))]
    async fn append(&self, job: &ConversionJob) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO conversion_jobs (
                owner_key, job_id, user_name, full_name, original_file_name,
                converted_file_name, file_type, result, created_at,
                original_size_bytes, output_size_bytes, download_reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (owner_key, job_id) DO UPDATE SET
                user_name = EXCLUDED.user_name,
                full_name = EXCLUDED.full_name,
                original_file_name = EXCLUDED.original_file_name,
                converted_file_name = EXCLUDED.converted_file_name,
                file_type = EXCLUDED.file_type,
                result = EXCLUDED.result,
                created_at = EXCLUDED.created_at,
                original_size_bytes = EXCLUDED.original_size_bytes,
                output_size_bytes = EXCLUDED.output_size_bytes,
                download_reference = EXCLUDED.download_reference
            "#,
        )
        .bind(&job.owner_key)
        .bind(&job.job_id)
        .bind(&job.user_name)
        .bind(&job.full_name)
        .bind(&job.original_file_name)
        .bind(&job.converted_file_name)
        .bind(job.file_type.extension())
        .bind(job.result.as_str())
        .bind(job.created_at)
        .bind(size_to_db(job.original_size_bytes)?)
        .bind(size_to_db(job.output_size_bytes)?)
        .bind(&job.download_reference)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "conversion_jobs",
        db.operation = "select"
    ))]
    async fn query_by_owner(
        &self,
        owner_key: &str,
        user_name: &str,
    ) -> LedgerResult<Vec<ConversionJob>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM conversion_jobs WHERE owner_key = $1 AND user_name = $2 \
             ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .bind(owner_key)
        .bind(user_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_job).collect()
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "conversion_jobs",
        db.operation = "select"
    ))]
    async fn scan_all(&self) -> LedgerResult<Vec<ConversionJob>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM conversion_jobs ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_job).collect()
    }

    fn backend(&self) -> LedgerBackend {
        LedgerBackend::Postgres
    }
}

#[cfg(test)]
mod tests {
    //! Run with `TEST_DATABASE_URL=postgres://... cargo test -p docpress-db -- --ignored`.

    use super::*;
    use chrono::{SubsecRound, Utc};
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn job(owner: &str, user: &str, id: &str) -> ConversionJob {
        ConversionJob {
            job_id: id.to_string(),
            owner_key: owner.to_string(),
            user_name: user.to_string(),
            full_name: Some("Alice Example".to_string()),
            original_file_name: "notes.docx".to_string(),
            converted_file_name: "notes.pdf".to_string(),
            file_type: FileType::Docx,
            result: JobResult::Success,
            created_at: Utc::now().trunc_subsecs(6),
            original_size_bytes: 4096,
            output_size_bytes: 20480,
            download_reference: format!("/api/file/download/{}.pdf", id),
        }
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_append_and_query_round_trip() {
        let pool = test_pool().await;
        let ledger = PgJobLedger::new(pool);
        let owner = format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        let stored = job(&owner, "alice", "alice-docx-1-00000001");
        ledger.append(&stored).await.unwrap();
        ledger
            .append(&job(&owner, "bob", "bob-docx-1-00000002"))
            .await
            .unwrap();

        let alice = ledger.query_by_owner(&owner, "alice").await.unwrap();
        assert_eq!(alice, vec![stored]);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_append_upserts_on_collision() {
        let pool = test_pool().await;
        let ledger = PgJobLedger::new(pool);
        let owner = format!("test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        let mut entry = job(&owner, "alice", "alice-docx-1-deadbeef");
        ledger.append(&entry).await.unwrap();
        entry.output_size_bytes = 1;
        ledger.append(&entry).await.unwrap();

        let alice = ledger.query_by_owner(&owner, "alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].output_size_bytes, 1);
    }
}
