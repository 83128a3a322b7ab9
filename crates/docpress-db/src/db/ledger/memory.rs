use super::{JobLedger, LedgerResult};
use docpress_core::{ConversionJob, LedgerBackend};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process ledger keyed by `(owner_key, job_id)`.
#[derive(Debug, Default)]
pub struct MemoryJobLedger {
    jobs: RwLock<BTreeMap<(String, String), ConversionJob>>,
}

impl MemoryJobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

fn newest_first(mut jobs: Vec<ConversionJob>) -> Vec<ConversionJob> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    jobs
}

#[async_trait::async_trait]
impl JobLedger for MemoryJobLedger {
    async fn append(&self, job: &ConversionJob) -> LedgerResult<()> {
        let key = (job.owner_key.clone(), job.job_id.clone());
        if self.jobs.write().await.insert(key, job.clone()).is_some() {
            tracing::warn!(job_id = %job.job_id, "Ledger entry overwritten by colliding job id");
        }
        Ok(())
    }

    async fn query_by_owner(
        &self,
        owner_key: &str,
        user_name: &str,
    ) -> LedgerResult<Vec<ConversionJob>> {
        let jobs = self.jobs.read().await;
        let matching = jobs
            .iter()
            .filter(|((owner, _), job)| owner == owner_key && job.user_name == user_name)
            .map(|(_, job)| job.clone())
            .collect();
        Ok(newest_first(matching))
    }

    async fn scan_all(&self) -> LedgerResult<Vec<ConversionJob>> {
        let jobs = self.jobs.read().await;
        Ok(newest_first(jobs.values().cloned().collect()))
    }

    fn backend(&self) -> LedgerBackend {
        LedgerBackend::Memory
    }
}
