//! Prometheus scrape endpoint

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Router serving `/metrics` from its own state
pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    Router::new()
        .route("/metrics", get(render))
        .with_state(handle)
}

/// GET /metrics
async fn render(State(handle): State<Arc<MetricsHandle>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}
