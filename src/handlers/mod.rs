// Handlers module
// HTTP handlers for the REST API

pub mod users;
pub mod emotions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{error::ApiError, state::SharedState};

pub const INFO_MESSAGE: &str = "This is the Emo Pop API.";

/// API info
/// GET /
/// Never touches the database
pub async fn api_info() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": INFO_MESSAGE })))
}

/// Health check handler
/// GET /health
/// Round-trips `SELECT 1` through the pool
pub async fn health_check(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.health_check().await?;

    Ok((StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" }))))
}
