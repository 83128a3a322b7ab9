//! Docpress API Library
//!
//! HTTP handlers, identity extraction and application setup for the
//! document-to-PDF conversion service.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use auth::Identity;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
