//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Used for the bookkeeping columns (`created_at`, `updated_at`) which are
/// always written by this crate.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a nullable datetime column
///
/// Unlike [`parse_datetime_or_now`] an unparseable value maps to `None`:
/// publication markers must never be invented.
pub fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        chrono::DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Format an optional timestamp for binding into a TEXT column
pub fn format_optional_datetime(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|dt| dt.to_rfc3339())
}

/// Upper bound on the ids bound into one statement
///
/// SQLite rejects statements with more than 32766 variables; batch
/// operations split their input into chunks of this size.
pub const BIND_CHUNK_SIZE: usize = 500;

/// Build a `?, ?, ?` placeholder list for an `IN (...)` clause
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
