//! Constants shared across crates.

/// Key prefix under which rendered PDFs are stored.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "conversions";

/// Application path that resolves a stored artifact to a presigned link.
pub const DOWNLOAD_PATH_PREFIX: &str = "/api/file/download";

/// Partition value used when `LEDGER_PARTITION_KEY` is not set.
pub const DEFAULT_LEDGER_PARTITION_KEY: &str = "docpress";

/// Default lifetime of a presigned download link.
pub const DEFAULT_PRESIGN_TTL_SECONDS: u64 = 3600;

/// Upper bound on page load plus PDF generation.
pub const DEFAULT_RENDER_TIMEOUT_SECONDS: u64 = 300;

pub const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 100;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
