//! Catalog Database Layer
//!
//! This crate provides the persistence layer for the catalog (artists,
//! releases, tracks and their join records), using SQLite via sqlx.
//! The [`store`] module defines the repository boundary consumed by the
//! publication engine.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
pub use store::{CatalogStore, CatalogTransaction, SqliteTransaction};

/// Re-export sqlx types for convenience
pub use sqlx::{Error as SqlxError, SqlitePool};
