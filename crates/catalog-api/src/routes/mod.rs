//! API routes

mod artists;
mod cache;
mod health;
pub mod metrics;
mod releases;
mod tracks;
pub mod types;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(releases::routes())
        .merge(artists::routes())
        .merge(tracks::routes())
        .merge(cache::routes())
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
