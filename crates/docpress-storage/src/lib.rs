//! Docpress Storage Library
//!
//! Artifact store abstraction for rendered PDFs, with S3 and local
//! filesystem implementations.
//!
//! # Key format
//!
//! Every artifact lives under a single prefix: `{prefix}/{artifact_file_name}`
//! (`conversions/alice_md_1700000000000_0a1b2c3d.pdf` by default).
//!
//! Keys must not contain `..` or a leading `/`. Key construction is centralized
//! in the `keys` module so all backends stay consistent.
//!
//! Local links carry an HMAC signature over the key and expiry
//! (`link_token`); S3 links are presigned by the bucket.

pub mod factory;
pub mod keys;
pub mod link_token;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docpress_core::StorageBackend;
pub use factory::{create_artifact_store, create_fallback_store};
pub use keys::ArtifactKeys;
pub use link_token::LinkError;
#[cfg(feature = "storage-local")]
pub use local::LocalStore;
#[cfg(feature = "storage-s3")]
pub use s3::S3Store;
pub use traits::{ArtifactStore, StorageError, StorageResult};
