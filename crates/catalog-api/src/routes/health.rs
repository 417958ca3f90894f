//! Liveness endpoints

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Whether the background cache sweep is alive
    pub cache_sweeper: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("catalog_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        cache_sweeper: state.cache.is_running(),
    })
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
