//! Artist routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use catalog_db::Artist;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::CreateArtistRequest;

/// GET /api/v1/artists
async fn list_artists(State(state): State<AppState>) -> Result<Json<Vec<Artist>>, ApiError> {
    Ok(Json(state.catalog.list_artists().await?))
}

/// POST /api/v1/artists
async fn create_artist(
    State(state): State<AppState>,
    Json(request): Json<CreateArtistRequest>,
) -> Result<(StatusCode, Json<Artist>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }

    let artist = state.catalog.create_artist(name.to_string()).await?;
    Ok((StatusCode::CREATED, Json(artist)))
}

/// Create artist routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/artists", get(list_artists).post(create_artist))
}
