//! Catalog REST API
//!
//! This crate provides the Axum-based HTTP API for the catalog: public
//! release listings served through the read cache, release and artist
//! management, and cache administration.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
