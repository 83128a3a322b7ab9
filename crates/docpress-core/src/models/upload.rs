use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Input formats the pipeline can turn into a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Html,
    Md,
    Docx,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Html, FileType::Md, FileType::Docx];

    /// Detect the type from a file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<FileType> {
        file_extension(file_name).and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Html => "html",
            FileType::Md => "md",
            FileType::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Html => "text/html",
            FileType::Md => "text/markdown",
            FileType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "html" => Ok(FileType::Html),
            "md" => Ok(FileType::Md),
            "docx" => Ok(FileType::Docx),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Lowercased extension of a file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// `report.md` -> `report.pdf`. Names without a supported extension get `.pdf` appended.
pub fn pdf_file_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.parse::<FileType>().is_ok() => {
            format!("{}.pdf", stem)
        }
        _ => format!("{}.pdf", original),
    }
}

/// A validated upload waiting in the staging area.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        UploadedFile {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_file_name(&self.file_name)
    }

    pub fn info(&self) -> StagedFileInfo {
        StagedFileInfo {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
        }
    }
}

/// Staged file metadata without the content buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFileInfo {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
}

impl From<StagedFileInfo> for UploadResponse {
    fn from(info: StagedFileInfo) -> Self {
        UploadResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            file_name: info.file_name,
            mime_type: info.mime_type,
            file_size: info.size_bytes,
        }
    }
}
