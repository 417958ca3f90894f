//! Track routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use catalog_db::{NewTrack, Track};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::CreateTrackRequest;

/// POST /api/v1/tracks
async fn create_track(
    State(state): State<AppState>,
    Json(request): Json<CreateTrackRequest>,
) -> Result<(StatusCode, Json<Track>), ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    if request.duration_secs.is_some_and(|secs| secs < 0) {
        return Err(ApiError::BadRequest(
            "Duration must not be negative".to_string(),
        ));
    }

    let track = state
        .catalog
        .create_track(NewTrack {
            title: title.to_string(),
            duration_secs: request.duration_secs,
            published_on: request.published_on,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(track)))
}

/// Create track routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/tracks", post(create_track))
}
