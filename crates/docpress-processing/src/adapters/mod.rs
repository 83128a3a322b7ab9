//! Format adapters: raw upload bytes in, a complete HTML document out.

mod docx;
mod html;
mod markdown;
pub mod shell;

pub use docx::DocxAdapter;
pub use html::{has_html_element, HtmlAdapter};
pub use markdown::MarkdownAdapter;

use bytes::Bytes;
use docpress_core::{AppError, FileType};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Adapter task failed: {0}")]
    Task(String),
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::UnsupportedFormat(file_type) => AppError::UnsupportedFormat(file_type),
            AdapterError::InvalidDocument(message) => AppError::AdapterFailure(message),
            AdapterError::Task(message) => AppError::Internal(message),
        }
    }
}

/// HTML produced by an adapter plus any non-fatal conversion warnings.
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub html: String,
    pub warnings: Vec<String>,
}

pub trait FormatAdapter: Send + Sync {
    fn file_type(&self) -> FileType;

    fn to_html(&self, raw: &[u8]) -> Result<AdapterOutput, AdapterError>;
}

pub fn adapter_for(file_type: FileType) -> &'static dyn FormatAdapter {
    match file_type {
        FileType::Html => &HtmlAdapter,
        FileType::Md => &MarkdownAdapter,
        FileType::Docx => &DocxAdapter,
    }
}

/// Convert by extension name (`"md"`, `".docx"`, ...).
pub fn convert_to_html(file_type: &str, raw: &[u8]) -> Result<AdapterOutput, AdapterError> {
    let file_type = file_type
        .parse::<FileType>()
        .map_err(AdapterError::UnsupportedFormat)?;
    adapter_for(file_type).to_html(raw)
}

/// Convert on the runtime. DOCX parsing is CPU bound and runs on the
/// blocking pool; the text formats are cheap enough to run inline.
pub async fn render_html(file_type: FileType, raw: Bytes) -> Result<AdapterOutput, AdapterError> {
    let output = match file_type {
        FileType::Docx => tokio::task::spawn_blocking(move || DocxAdapter.to_html(&raw))
            .await
            .map_err(|e| AdapterError::Task(e.to_string()))??,
        other => adapter_for(other).to_html(&raw)?,
    };

    for warning in &output.warnings {
        tracing::warn!(file_type = %file_type, warning = %warning, "Document conversion warning");
    }

    Ok(output)
}

/// Decode upload bytes as UTF-8, dropping a BOM. Invalid sequences are
/// replaced rather than rejected.
pub(crate) fn decode_text(raw: &[u8]) -> (String, Vec<String>) {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(text) => (text.to_string(), Vec::new()),
        Err(_) => (
            String::from_utf8_lossy(raw).into_owned(),
            vec!["Input is not valid UTF-8; invalid bytes were replaced".to_string()],
        ),
    }
}
