//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// Liveness plus renderer pool, store and ledger details.
pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let renderer = state.renderer();
    let stats = renderer.stats();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "renderer": {
                "mode": renderer.mode().to_string(),
                "timeoutSeconds": renderer.timeout().as_secs(),
                "idle": stats.idle,
                "inUse": stats.in_use,
                "created": stats.created,
                "discarded": stats.discarded,
            },
            "storage": state.storage_backend.to_string(),
            "ledger": state.ledger_backend.to_string(),
        })),
    )
}
