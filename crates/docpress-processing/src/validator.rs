use docpress_core::models::file_extension;
use docpress_core::FileType;

/// Reasons an upload is refused before it reaches staging
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Upload intake validator
///
/// Only the extension decides the file type. Browsers report Markdown and
/// DOCX uploads under a zoo of content types (`application/octet-stream`,
/// `text/x-markdown`, ...), so the declared type is normalized rather than
/// enforced.
pub struct UploadValidator {
    max_file_size: u64,
}

impl UploadValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the extension and return the detected file type
    pub fn validate_extension(&self, file_name: &str) -> Result<FileType, ValidationError> {
        if file_name.trim().is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains('\0')
        {
            return Err(ValidationError::InvalidFilename(file_name.to_string()));
        }

        let extension = file_extension(file_name).unwrap_or_default();
        extension
            .parse::<FileType>()
            .map_err(|_| ValidationError::InvalidExtension {
                extension,
                allowed: FileType::ALL
                    .iter()
                    .map(|t| format!(".{}", t.extension()))
                    .collect(),
            })
    }

    /// The content type recorded for a staged file.
    ///
    /// Generic or missing declarations are replaced with the canonical type
    /// for the extension; anything more specific is kept as sent.
    pub fn effective_content_type(&self, file_type: FileType, declared: Option<&str>) -> String {
        match declared.map(|ct| ct.trim().to_lowercase()) {
            Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct,
            _ => file_type.mime_type().to_string(),
        }
    }

    /// Validate name and size, returning the detected file type
    pub fn validate_all(&self, file_name: &str, file_size: u64) -> Result<FileType, ValidationError> {
        let file_type = self.validate_extension(file_name)?;
        self.validate_file_size(file_size)?;
        Ok(file_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(1024 * 1024) // 1MB
    }

    #[test]
    fn test_validate_file_size_ok() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(2 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension_ok() {
        let validator = test_validator();
        assert_eq!(validator.validate_extension("notes.docx").unwrap(), FileType::Docx);
        assert_eq!(validator.validate_extension("README.MD").unwrap(), FileType::Md);
        assert_eq!(validator.validate_extension("page.html").unwrap(), FileType::Html);
    }

    #[test]
    fn test_validate_extension_invalid() {
        let validator = test_validator();
        let err = validator.validate_extension("notes.txt").unwrap_err();
        match err {
            ValidationError::InvalidExtension { extension, allowed } => {
                assert_eq!(extension, "txt");
                assert_eq!(allowed, vec![".html", ".md", ".docx"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validator.validate_extension("no_extension").is_err());
    }

    #[test]
    fn test_validate_extension_rejects_paths() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_extension("../secret.md"),
            Err(ValidationError::InvalidFilename(_))
        ));
        assert!(matches!(
            validator.validate_extension("  "),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_validate_all_checks_extension_before_size() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_all("notes.txt", 0),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validator.validate_all("notes.md", 0),
            Err(ValidationError::EmptyFile)
        ));
        assert_eq!(validator.validate_all("notes.md", 10).unwrap(), FileType::Md);
    }

    #[test]
    fn test_effective_content_type() {
        let validator = test_validator();
        assert_eq!(
            validator.effective_content_type(FileType::Md, Some("application/octet-stream")),
            "text/markdown"
        );
        assert_eq!(
            validator.effective_content_type(FileType::Html, None),
            "text/html"
        );
        assert_eq!(
            validator.effective_content_type(FileType::Md, Some("text/x-markdown")),
            "text/x-markdown"
        );
    }
}
