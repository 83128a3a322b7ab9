use docpress_core::ConversionJob;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Append-only JSON Lines file of jobs the ledger would not accept.
///
/// One `ConversionJob` per line, replayable into the ledger once it is
/// reachable again.
#[derive(Debug, Clone)]
pub struct DeadLetterLog {
    path: PathBuf,
}

impl DeadLetterLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, job: &ConversionJob) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Every job recorded so far, oldest first. Unparseable lines are skipped.
    pub async fn read_all(&self) -> std::io::Result<Vec<ConversionJob>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(job) => Some(job),
                Err(e) => {
                    tracing::warn!(error = %e, path = %self.path.display(), "Skipping corrupt dead-letter line");
                    None
                }
            })
            .collect())
    }
}
