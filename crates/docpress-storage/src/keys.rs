//! Shared key construction for storage backends.
//!
//! Key format: `{prefix}/{artifact_file_name}`.

use crate::traits::{StorageError, StorageResult};

/// Builds and parses artifact keys under one fixed prefix.
#[derive(Debug, Clone)]
pub struct ArtifactKeys {
    prefix: String,
}

impl ArtifactKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        ArtifactKeys {
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key for an artifact file name. The name must be a single path segment.
    pub fn key_for(&self, file_name: &str) -> StorageResult<String> {
        if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "Artifact file name must be a single path segment: {}",
                file_name
            )));
        }
        let key = format!("{}/{}", self.prefix, file_name);
        validate_key(&key)?;
        Ok(key)
    }

    /// Inverse of [`ArtifactKeys::key_for`].
    pub fn file_name_of<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?.strip_prefix('/')
    }
}

/// Keys must not contain `..` or start with `/`.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_uses_prefix() {
        let keys = ArtifactKeys::new("conversions/");
        assert_eq!(
            keys.key_for("alice_md_1_abc.pdf").unwrap(),
            "conversions/alice_md_1_abc.pdf"
        );
        assert_eq!(
            keys.file_name_of("conversions/alice_md_1_abc.pdf"),
            Some("alice_md_1_abc.pdf")
        );
        assert_eq!(keys.file_name_of("other/alice.pdf"), None);
    }

    #[test]
    fn test_key_for_rejects_traversal() {
        let keys = ArtifactKeys::new("conversions");
        assert!(keys.key_for("../secret.pdf").is_err());
        assert!(keys.key_for("a/b.pdf").is_err());
        assert!(keys.key_for("..").is_err());
        assert!(keys.key_for("").is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("conversions/x.pdf").is_ok());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("conversions/../x").is_err());
    }
}
