// Emotion handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::{error::ApiError, state::SharedState};

/// Load the full emotion reference set
/// GET /api/load-emotions
pub async fn load_emotions(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Loading emotions");

    let emotions = state.db.get_all_emotions().await?;

    info!("Retrieved {} emotions", emotions.len());
    Ok((StatusCode::OK, Json(emotions)))
}
