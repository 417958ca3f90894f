//! Catalog Core Business Logic
//!
//! This crate provides the release-publication consistency engine:
//! the publication cascade, artist association reconciliation, and the
//! time-bounded read-through cache fronting public read paths.

pub mod associations;
pub mod cache;
pub mod error;
pub mod publication;
pub mod service;

pub use associations::{AssociationPlan, JoinRecord, reconcile};
pub use cache::{CacheStats, TtlCache, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
pub use error::{CoreError, ErrorKind};
pub use publication::{CascadeOutcome, PublicationCascade};
pub use service::{
    AssociationSync, CacheTtls, CatalogService, ReleaseDetail, ReleaseUpdateOutcome,
    ReleaseUpdateRequest,
};
