use docpress_core::{StagedFileInfo, UploadedFile};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Per-user upload slot.
///
/// Each user has at most one staged file. A new upload replaces the old one
/// and `take` hands the file to exactly one conversion.
#[derive(Default)]
pub struct UploadStaging {
    slots: RwLock<HashMap<String, UploadedFile>>,
}

impl UploadStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `file` for `owner`, replacing anything already staged.
    pub async fn store(&self, owner: &str, file: UploadedFile) -> StagedFileInfo {
        let info = file.info();
        let replaced = self.slots.write().await.insert(owner.to_string(), file);

        if let Some(previous) = replaced {
            tracing::debug!(
                owner = %owner,
                replaced_file = %previous.file_name,
                file_name = %info.file_name,
                "Replaced staged upload"
            );
        }

        info
    }

    /// Remove and return the staged file for `owner`.
    pub async fn take(&self, owner: &str) -> Option<UploadedFile> {
        self.slots.write().await.remove(owner)
    }

    pub async fn peek(&self, owner: &str) -> Option<StagedFileInfo> {
        self.slots.read().await.get(owner).map(UploadedFile::info)
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}
