// User handlers
// Register-or-check for players

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::user::RegisterUserRequest,
    state::SharedState,
};

/// Register a user, or report that it already exists
/// POST /api/users
/// 201 with `created: true` for a new name, 200 with `created: false` otherwise
pub async fn register_user(
    State(state): State<SharedState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    info!("Registering user: {}", request.name.trim());

    let status = state.db.find_or_create_user(request).await?;

    let code = if status.created {
        info!("Created user {} with id: {}", status.user.name, status.user.id);
        StatusCode::CREATED
    } else {
        info!("User {} already registered", status.user.name);
        StatusCode::OK
    };

    Ok((code, Json(status)))
}
