//! Data models for the application
//!
//! Organized by domain: staged uploads, ledger jobs, and caller identity.

mod identity;
mod job;
mod upload;

pub use identity::*;
pub use job::*;
pub use upload::*;
