use crate::auth::Identity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use docpress_core::models::AllJobsResponse;
use docpress_core::ConversionJob;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/job/my",
    tag = "jobs",
    responses(
        (status = 200, description = "Caller's conversions, newest first", body = Vec<ConversionJob>),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    )
)]
pub async fn my_jobs(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<ConversionJob>>, HttpAppError> {
    Ok(Json(state.jobs.my_jobs(&identity.0).await?))
}

#[utoipa::path(
    get,
    path = "/api/job/all",
    tag = "jobs",
    responses(
        (status = 200, description = "Every recorded conversion", body = AllJobsResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    )
)]
pub async fn all_jobs(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<AllJobsResponse>, HttpAppError> {
    let jobs = state.jobs.all_jobs(&identity.0).await?;
    Ok(Json(AllJobsResponse { jobs }))
}
