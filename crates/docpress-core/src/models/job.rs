use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::upload::FileType;
use crate::constants::DOWNLOAD_PATH_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobResult {
    Success,
    Failure,
}

impl JobResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobResult::Success => "success",
            JobResult::Failure => "failure",
        }
    }
}

impl std::str::FromStr for JobResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(JobResult::Success),
            "failure" => Ok(JobResult::Failure),
            other => Err(format!("unknown job result: {}", other)),
        }
    }
}

/// Ledger entry for one finished conversion. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionJob {
    pub job_id: String,
    pub owner_key: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub original_file_name: String,
    pub converted_file_name: String,
    pub file_type: FileType,
    pub result: JobResult,
    pub created_at: DateTime<Utc>,
    pub original_size_bytes: u64,
    pub output_size_bytes: u64,
    pub download_reference: String,
}

/// Identifiers minted for one conversion attempt.
///
/// The random suffix keeps two conversions by the same user in the same
/// millisecond from colliding in either the ledger or the artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNaming {
    pub user_segment: String,
    pub file_type: FileType,
    pub epoch_millis: i64,
    pub suffix: String,
}

impl JobNaming {
    pub fn new(user_name: &str, file_type: FileType, epoch_millis: i64, suffix: String) -> Self {
        JobNaming {
            user_segment: safe_user_segment(user_name),
            file_type,
            epoch_millis,
            suffix,
        }
    }

    /// `{user}-{type}-{millis}-{suffix}`
    pub fn job_id(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.user_segment, self.file_type, self.epoch_millis, self.suffix
        )
    }

    /// `{user}_{type}_{millis}_{suffix}.pdf`
    pub fn artifact_file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.pdf",
            self.user_segment, self.file_type, self.epoch_millis, self.suffix
        )
    }

    pub fn download_reference(&self) -> String {
        download_reference(&self.artifact_file_name())
    }
}

/// Stable application path for an artifact; unlike a presigned URL it never expires.
pub fn download_reference(artifact_file_name: &str) -> String {
    format!("{}/{}", DOWNLOAD_PATH_PREFIX, artifact_file_name)
}

/// User name encoded for object keys and job ids.
///
/// ASCII letters, digits, `-`, `@` and single dots pass through; every other
/// byte becomes `~xx`. The encoding is reversible, so distinct users never
/// share a segment, and it never yields `_` (the artifact name separator)
/// or `..`.
pub fn safe_user_segment(user_name: &str) -> String {
    let mut segment = String::with_capacity(user_name.len());
    let mut previous = None;
    for byte in user_name.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'@')
            || (byte == b'.' && previous != Some(b'.'));
        if keep {
            segment.push(char::from(byte));
        } else {
            segment.push_str(&format!("~{:02x}", byte));
        }
        previous = Some(byte);
    }
    segment
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub message: String,
    pub job_id: String,
    pub original_file: String,
    pub converted_file: String,
    pub download_url: String,
    pub file_size: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinkResponse {
    pub download_url: String,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllJobsResponse {
    pub jobs: Vec<ConversionJob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_naming_formats() {
        let naming = JobNaming::new("alice", FileType::Md, 1_700_000_000_000, "0a1b2c3d".into());
        assert_eq!(naming.job_id(), "alice-md-1700000000000-0a1b2c3d");
        assert_eq!(
            naming.artifact_file_name(),
            "alice_md_1700000000000_0a1b2c3d.pdf"
        );
        assert_eq!(
            naming.download_reference(),
            "/api/file/download/alice_md_1700000000000_0a1b2c3d.pdf"
        );
    }

    #[test]
    fn test_user_segment_escapes_path_characters() {
        assert_eq!(safe_user_segment("bob/../x"), "bob~2f.~2e~2fx");
        assert_eq!(safe_user_segment("n1234@qut.edu.au"), "n1234@qut.edu.au");
        assert_eq!(safe_user_segment("Jane Doe"), "Jane~20Doe");
    }

    #[test]
    fn test_user_segment_keeps_users_apart() {
        assert_ne!(safe_user_segment("Jane Doe"), safe_user_segment("Jane_Doe"));
        assert_ne!(safe_user_segment("Jane_Doe"), safe_user_segment("Jane~5fDoe"));
        assert_eq!(safe_user_segment("alice_x"), "alice~5fx");

        // The separator never appears inside a segment, so `alice` cannot
        // claim a name minted for `alice_x`.
        let theirs = JobNaming::new("alice_x", FileType::Md, 1, "00000000".into());
        assert!(!theirs
            .artifact_file_name()
            .starts_with(&format!("{}_", safe_user_segment("alice"))));
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = ConversionJob {
            job_id: "alice-md-1-00000000".into(),
            owner_key: "docpress".into(),
            user_name: "alice".into(),
            full_name: None,
            original_file_name: "report.md".into(),
            converted_file_name: "report.pdf".into(),
            file_type: FileType::Md,
            result: JobResult::Success,
            created_at: Utc::now(),
            original_size_bytes: 10,
            output_size_bytes: 20,
            download_reference: "/api/file/download/x.pdf".into(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobId"], "alice-md-1-00000000");
        assert_eq!(value["fileType"], "md");
        assert_eq!(value["result"], "success");
        assert!(value.get("fullName").is_none());
    }
}
