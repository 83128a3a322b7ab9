//! Error types module
//!
//! All failures a client can observe are unified under [`AppError`]. Each
//! crate keeps its own narrow error enum and converts into this one at the
//! service boundary, so the HTTP layer only has to understand one taxonomy.

use std::io;

/// Level a failed request is logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: nothing staged, wrong extension, unknown file
    Debug,
    Warn,
    /// Failures on our side: renderer, store, ledger
    Error,
}

/// How an error presents itself over HTTP.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable upper-snake code, e.g. `RENDER_TIMEOUT`
    fn error_code(&self) -> &'static str;

    /// Retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show an end user
    fn client_message(&self) -> String;

    /// Internal detail (backend names, paths) must not reach the client
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No file staged for conversion")]
    NoFileStaged,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Document conversion failed: {0}")]
    AdapterFailure(String),

    #[error("Render timed out after {0} seconds")]
    RenderTimeout(u64),

    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("Artifact store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Job ledger write failed: {0}")]
    LedgerWriteFailure(String),

    #[error("Job ledger error: {0}")]
    Ledger(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::NoFileStaged => (
            400,
            "NO_FILE_STAGED",
            false,
            Some("Upload a file before requesting a conversion"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFormat(_) => (
            400,
            "UNSUPPORTED_FORMAT",
            false,
            Some("Upload an .html, .md or .docx file"),
            false,
            LogLevel::Debug,
        ),
        AppError::AdapterFailure(_) => (
            400,
            "DOCUMENT_CONVERSION_ERROR",
            false,
            Some("Check that the document is valid and not corrupted"),
            false,
            LogLevel::Warn,
        ),
        AppError::RenderTimeout(_) => (
            500,
            "RENDER_TIMEOUT",
            false,
            Some("Simplify the document or contact support if this persists"),
            false,
            LogLevel::Error,
        ),
        AppError::RenderFailure(_) => (
            500,
            "RENDER_FAILURE",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::StoreUnavailable(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::LedgerWriteFailure(_) => (
            500,
            "LEDGER_WRITE_FAILURE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Ledger(_) => (
            500,
            "LEDGER_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file name exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in and retry"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Variant name, shown next to details outside production.
    pub fn error_type(&self) -> &str {
        match self {
            AppError::NoFileStaged => "NoFileStaged",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::AdapterFailure(_) => "AdapterFailure",
            AppError::RenderTimeout(_) => "RenderTimeout",
            AppError::RenderFailure(_) => "RenderFailure",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::LedgerWriteFailure(_) => "LedgerWriteFailure",
            AppError::Ledger(_) => "Ledger",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Display text followed by up to five `Caused by:` lines from the source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;
        const MAX_DEPTH: usize = 5;

        let chain: Vec<String> = std::iter::successors(self.source(), |&e| e.source())
            .map(|e| format!("\n  Caused by: {}", e))
            .collect();

        let mut details = self.to_string();
        for cause in chain.iter().take(MAX_DEPTH) {
            details.push_str(cause);
        }
        if chain.len() > MAX_DEPTH {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NoFileStaged => "No file uploaded. Please upload a file first.".to_string(),
            AppError::UnsupportedFormat(ref msg) => format!("Unsupported file type: {}", msg),
            AppError::AdapterFailure(ref msg) => format!("Error converting file: {}", msg),
            AppError::RenderTimeout(secs) => {
                format!("Error converting file: rendering exceeded {} seconds", secs)
            }
            AppError::RenderFailure(_) => "Error converting file".to_string(),
            AppError::StoreUnavailable(_) => "Failed to store converted file".to_string(),
            AppError::LedgerWriteFailure(_) => "Failed to record conversion job".to_string(),
            AppError::Ledger(_) => "Failed to access job records".to_string(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
