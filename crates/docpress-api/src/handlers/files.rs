//! Serves artifacts from the local store for links minted by
//! `LocalStore::presign_get`.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use docpress_core::constants::PDF_CONTENT_TYPE;
use docpress_core::AppError;
use docpress_storage::link_token;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    expires: Option<i64>,
    signature: Option<String>,
}

pub async fn serve_artifact(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let not_found = || HttpAppError::from(AppError::NotFound("File not found".to_string()));

    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        tracing::debug!(key = %key, "Rejected unsigned artifact link");
        return Err(not_found());
    };
    let secret = state.config.storage().link_signing_secret.as_bytes();
    if let Err(e) = link_token::verify(secret, &key, expires, signature) {
        tracing::debug!(key = %key, reason = %e, "Rejected artifact link");
        return Err(not_found());
    }

    let data = state.artifacts.read(&key).await.map_err(AppError::from)?;

    let file_name = key.rsplit('/').next().unwrap_or(key.as_str()).to_string();
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        data,
    ))
}
