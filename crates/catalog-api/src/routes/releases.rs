//! Release routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use catalog_core::{ReleaseDetail, ReleaseUpdateRequest};
use catalog_db::{NewRelease, PublishedRelease, Release, ReleaseTrack, UpdateRelease};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    CreateReleaseRequest, LinkTrackRequest, UpdateReleaseRequest, UpdateReleaseResponse,
};

// ==================== Public Routes ====================

/// GET /api/v1/releases/published
async fn list_published(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublishedRelease>>, ApiError> {
    Ok(Json(state.catalog.published_releases().await?))
}

/// GET /api/v1/releases/{id}
async fn get_release(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReleaseDetail>, ApiError> {
    Ok(Json(state.catalog.release_detail(id).await?))
}

// ==================== Management Routes ====================

/// POST /api/v1/releases
async fn create_release(
    State(state): State<AppState>,
    Json(request): Json<CreateReleaseRequest>,
) -> Result<(StatusCode, Json<Release>), ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }

    let release = state
        .catalog
        .create_release(NewRelease {
            title: title.to_string(),
            description: request.description,
            published_at: request.published_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(release)))
}

/// PUT /api/v1/releases/{id}
async fn update_release(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateReleaseRequest>,
) -> Result<Json<UpdateReleaseResponse>, ApiError> {
    let title = match request.title {
        Some(title) if title.trim().is_empty() => {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
        Some(title) => Some(title.trim().to_string()),
        None => None,
    };

    debug!("Updating release {}", id);

    let outcome = state
        .catalog
        .update_release(
            id,
            ReleaseUpdateRequest {
                fields: UpdateRelease {
                    title,
                    description: request.description,
                    published_at: request.published_at,
                },
                artist_ids: request.artist_ids,
            },
        )
        .await?;

    if outcome.is_partial() {
        warn!("Release {} saved without its artist changes", id);
    }

    Ok(Json(UpdateReleaseResponse::from(outcome)))
}

/// DELETE /api/v1/releases/{id}
async fn delete_release(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete_release(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/releases/{id}/tracks
async fn link_track(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<LinkTrackRequest>,
) -> Result<(StatusCode, Json<ReleaseTrack>), ApiError> {
    let link = state
        .catalog
        .link_track(id, request.track_id, request.position)
        .await?;

    Ok((StatusCode::CREATED, Json(link)))
}

/// Create release routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/releases", post(create_release))
        .route("/api/v1/releases/published", get(list_published))
        .route(
            "/api/v1/releases/{id}",
            get(get_release).put(update_release).delete(delete_release),
        )
        .route("/api/v1/releases/{id}/tracks", post(link_track))
}
