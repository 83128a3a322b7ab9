pub mod convert;
pub mod download;
pub mod files;
pub mod jobs;
pub mod upload;
