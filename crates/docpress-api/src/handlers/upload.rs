use crate::auth::Identity;
use crate::error::{multipart_error, validation_error, ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use docpress_core::models::UploadResponse;
use docpress_core::{AppError, UploadedFile};
use std::sync::Arc;

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/api/file/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File staged for conversion", body = UploadResponse),
        (status = 400, description = "Missing file, bad extension or file too large", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, identity, multipart), fields(user = %identity.0.user_name))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let Identity(user) = identity;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
        let declared_type = field.content_type().map(str::to_string);
        let content = field.bytes().await.map_err(multipart_error)?;

        let file_type = state
            .validator
            .validate_all(&file_name, content.len() as u64)
            .map_err(validation_error)?;
        let mime_type = state
            .validator
            .effective_content_type(file_type, declared_type.as_deref());

        let info = state
            .staging
            .store(user.staging_key(), UploadedFile::new(file_name, mime_type, content))
            .await;

        tracing::info!(
            file_name = %info.file_name,
            size_bytes = info.size_bytes,
            file_type = %file_type,
            "File staged"
        );

        return Ok(Json(UploadResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            file_name: info.file_name,
            mime_type: info.mime_type,
            file_size: info.size_bytes,
        }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()).into())
}
