use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use docpress_core::models::ConvertResponse;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/file/convert",
    tag = "files",
    responses(
        (status = 200, description = "Staged file converted to PDF", body = ConvertResponse),
        (status = 400, description = "Nothing staged or unsupported file type", body = ErrorResponse),
        (status = 500, description = "Rendering or storage failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity), fields(user = %identity.0.user_name))]
pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<ConvertResponse>, HttpAppError> {
    let receipt = state.conversions.convert(&identity.0).await?;

    Ok(Json(ConvertResponse {
        message: "File converted successfully".to_string(),
        job_id: receipt.job.job_id,
        original_file: receipt.job.original_file_name,
        converted_file: receipt.job.converted_file_name,
        download_url: receipt.download_url,
        file_size: receipt.job.output_size_bytes,
    }))
}
