//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! identity in `x-user-*` headers and this module only reads them.

use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use docpress_core::{AppError, UserContext, UserRole};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_FULL_NAME_HEADER: &str = "x-user-full-name";

/// Verified caller, extracted from request headers.
#[derive(Debug, Clone)]
pub struct Identity(pub UserContext);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_name = header(headers, USER_NAME_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing user identity".to_string()))?;

        Ok(Identity(UserContext {
            user_id: header(headers, USER_ID_HEADER)
                .unwrap_or_default()
                .to_string(),
            user_name: user_name.to_string(),
            role: header(headers, USER_ROLE_HEADER)
                .map(UserRole::parse_lenient)
                .unwrap_or(UserRole::User),
            full_name: header(headers, USER_FULL_NAME_HEADER).map(String::from),
        }))
    }
}

// Read straight from the parts so the extractor composes with Multipart.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers).map_err(HttpAppError::from)
    }
}
