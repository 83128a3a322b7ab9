use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use docpress_core::models::DownloadLinkResponse;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/file/download/{filename}",
    tag = "files",
    params(("filename" = String, Path, description = "Artifact file name, as returned in a job's download reference")),
    responses(
        (status = 200, description = "Fresh time-limited link", body = DownloadLinkResponse),
        (status = 404, description = "No such artifact for this caller", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity), fields(user = %identity.0.user_name))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(filename): Path<String>,
) -> Result<Json<DownloadLinkResponse>, HttpAppError> {
    let link = state
        .conversions
        .resolve_download(&identity.0, &filename)
        .await?;

    Ok(Json(DownloadLinkResponse {
        download_url: link.url,
        expires_in_seconds: link.expires_in_seconds,
    }))
}
