//! Cache administration routes

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::CacheStatsResponse;

/// GET /api/v1/cache/stats
async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStatsResponse>, ApiError> {
    let stats = state.cache.stats();

    let lookups = stats.hit_count + stats.miss_count;
    let hit_rate = if lookups > 0 {
        stats.hit_count as f64 / lookups as f64
    } else {
        0.0
    };

    Ok(Json(CacheStatsResponse {
        entry_count: stats.entry_count,
        keys: stats.keys,
        hit_count: stats.hit_count,
        miss_count: stats.miss_count,
        hit_rate,
        sweeper_running: state.cache.is_running(),
    }))
}

/// DELETE /api/v1/cache
async fn clear_cache(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.cache.clear();
    info!("Cleared {} cache entries", count);

    Ok(Json(serde_json::json!({
        "cleared": count
    })))
}

/// POST /api/v1/cache/sweep
async fn sweep_cache(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.cache.sweep();
    info!("Swept {} expired cache entries", count);

    Ok(Json(serde_json::json!({
        "swept": count
    })))
}

/// Create cache routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/cache/stats", get(cache_stats))
        .route("/api/v1/cache", delete(clear_cache))
        .route("/api/v1/cache/sweep", post(sweep_cache))
}
