use crate::dead_letter::DeadLetterLog;
use docpress_core::models::download_reference;
use docpress_core::{AppError, Config, ConversionJob, UserContext};
use docpress_db::JobLedger;
use std::sync::Arc;
use std::time::Duration;

/// Exponential backoff for ledger writes: `base_delay * 2^attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Upper bound on a single backoff sleep.
    const MAX_DELAY: Duration = Duration::from_secs(10);

    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Self::MAX_DELAY)
            .min(Self::MAX_DELAY)
    }
}

/// What happened to a job record handed to [`JobService::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// Ledger refused every attempt; the job went to the dead-letter file
    DeadLettered,
    /// Neither the ledger nor the dead-letter file took it
    Lost,
}

/// Job records: writing with retry, and the per-user and admin listings.
pub struct JobService {
    ledger: Arc<dyn JobLedger>,
    partition_key: String,
    retry: RetryPolicy,
    dead_letter: DeadLetterLog,
}

impl JobService {
    pub fn new(
        ledger: Arc<dyn JobLedger>,
        partition_key: String,
        retry: RetryPolicy,
        dead_letter: DeadLetterLog,
    ) -> Self {
        Self {
            ledger,
            partition_key,
            retry,
            dead_letter,
        }
    }

    pub fn from_config(config: &Config, ledger: Arc<dyn JobLedger>) -> Self {
        let settings = config.ledger();
        Self::new(
            ledger,
            settings.partition_key.clone(),
            RetryPolicy {
                attempts: settings.retry_attempts,
                base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            },
            DeadLetterLog::new(settings.dead_letter_path.clone()),
        )
    }

    /// Partition every job of this deployment is written under.
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    pub fn dead_letter(&self) -> &DeadLetterLog {
        &self.dead_letter
    }

    /// Append with exponential backoff, giving up after the configured retries.
    async fn append_with_retry(&self, job: &ConversionJob) -> Result<(), AppError> {
        let mut retry = 0;
        loop {
            match self.ledger.append(job).await {
                Ok(()) => return Ok(()),
                Err(e) if retry < self.retry.attempts => {
                    let delay = self.retry.delay_for(retry);
                    tracing::warn!(
                        error = %e,
                        job_id = %job.job_id,
                        attempt = retry + 1,
                        max_retries = self.retry.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Ledger write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    return Err(AppError::LedgerWriteFailure(format!(
                        "{} (after {} attempts)",
                        e,
                        retry + 1
                    )))
                }
            }
        }
    }

    /// Append a job. Never fails the caller: after the retries are spent the
    /// job is written to the dead-letter file instead.
    pub async fn record(&self, job: &ConversionJob) -> RecordOutcome {
        let Err(err) = self.append_with_retry(job).await else {
            return RecordOutcome::Recorded;
        };

        tracing::error!(
            error = %err,
            job_id = %job.job_id,
            dead_letter_path = %self.dead_letter.path().display(),
            "Writing job to dead-letter file"
        );
        match self.dead_letter.append(job).await {
            Ok(()) => RecordOutcome::DeadLettered,
            Err(io_err) => {
                tracing::error!(
                    error = %io_err,
                    job_id = %job.job_id,
                    "Dead-letter write failed, job record lost"
                );
                RecordOutcome::Lost
            }
        }
    }

    /// The caller's own jobs, newest first.
    pub async fn my_jobs(&self, user: &UserContext) -> Result<Vec<ConversionJob>, AppError> {
        Ok(self
            .ledger
            .query_by_owner(&self.partition_key, &user.user_name)
            .await?)
    }

    /// Whether the caller's own ledger entries include the artifact
    /// `file_name`. The ledger, not the name, decides ownership.
    pub async fn owns_artifact(&self, user: &UserContext, file_name: &str) -> Result<bool, AppError> {
        let reference = download_reference(file_name);
        Ok(self
            .my_jobs(user)
            .await?
            .iter()
            .any(|job| job.download_reference == reference))
    }

    /// Every job in the ledger. Admins only.
    pub async fn all_jobs(&self, user: &UserContext) -> Result<Vec<ConversionJob>, AppError> {
        if !user.is_admin() {
            return Err(AppError::Forbidden("Unauthorized".to_string()));
        }
        Ok(self.ledger.scan_all().await?)
    }
}
