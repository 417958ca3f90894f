//! Application state

use catalog_core::{CatalogService, TtlCache};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Handle used to render the Prometheus scrape output
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub cache: Arc<TtlCache>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        let cache = catalog.cache().clone();
        Self { catalog, cache }
    }
}
