//! Read-through caching for public read paths

mod read_through;
mod store;

pub use store::{CacheStats, TtlCache, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
