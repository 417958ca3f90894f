//! Core error types

use catalog_db::{DbError, SqlxError};
use thiserror::Error;
use tracing::warn;

/// Failure kind, for programmatic matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unavailable,
    Unknown,
}

#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// The target row does not exist at the time of the mutation
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Offending column, when the store reports it
        field: Option<String>,
        message: String,
    },

    /// The store could not be reached; the effect of the operation is unknown
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Anything else. The message is for logs only.
    #[error("Update failed: {0}")]
    Unknown(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict { .. } => ErrorKind::Conflict,
            CoreError::Unavailable(_) => ErrorKind::Unavailable,
            CoreError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Column the error applies to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CoreError::Conflict { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Whether repeating the operation is safe and may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Unavailable(_))
    }

    /// Message suitable for end users
    ///
    /// Not-found and conflict errors name what went wrong; the other kinds
    /// never expose the underlying message.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::NotFound(what) => format!("{} was not found", what),
            CoreError::Conflict {
                field: Some(field), ..
            } => format!("This {} is already in use", field),
            CoreError::Conflict { message, .. } => message.clone(),
            CoreError::Unavailable(_) => {
                "The catalog is temporarily unavailable. Please try again.".to_string()
            }
            CoreError::Unknown(_) => {
                "Something went wrong while saving. Please try again.".to_string()
            }
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => CoreError::NotFound(msg),
            DbError::Duplicate(msg) => CoreError::Conflict {
                field: None,
                message: msg,
            },
            DbError::Database(e) => classify_sqlx(e),
        }
    }
}

fn classify_sqlx(err: SqlxError) -> CoreError {
    match err {
        SqlxError::RowNotFound => CoreError::NotFound("Row".to_string()),
        SqlxError::Database(ref db) if db.is_unique_violation() => {
            let message = db.message().to_string();
            CoreError::Conflict {
                field: unique_violation_field(&message),
                message,
            }
        }
        SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed
        | SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::Configuration(_) => CoreError::Unavailable(err.to_string()),
        other => {
            warn!("Unclassified database error: {}", other);
            CoreError::Unknown(other.to_string())
        }
    }
}

/// Extract the field from SQLite's `UNIQUE constraint failed: table.column`
///
/// Join tables report the entity being linked (`track`, `artist`) rather
/// than the first column of their composite key.
fn unique_violation_field(message: &str) -> Option<String> {
    let columns = message.split("constraint failed:").nth(1)?;
    let first = columns.split(',').next()?.trim();
    let (table, column) = first.rsplit_once('.').unwrap_or(("", first));
    match table.trim() {
        "release_tracks" => Some("track".to_string()),
        "artist_releases" => Some("artist".to_string()),
        _ if column.trim().is_empty() => None,
        _ => Some(column.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_field() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: releases.title").as_deref(),
            Some("title")
        );
        assert_eq!(
            unique_violation_field(
                "UNIQUE constraint failed: artist_releases.artist_id, artist_releases.release_id"
            )
            .as_deref(),
            Some("artist")
        );
        assert_eq!(
            unique_violation_field(
                "UNIQUE constraint failed: release_tracks.release_id, release_tracks.track_id"
            )
            .as_deref(),
            Some("track")
        );
        assert!(unique_violation_field("disk I/O error").is_none());
    }

    #[test]
    fn test_db_error_classification() {
        let err = CoreError::from(DbError::NotFound("Release 7".to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "Release 7 was not found");

        let err = CoreError::from(DbError::Duplicate("Artist 'X' already exists".to_string()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.user_message(), "Artist 'X' already exists");

        let err = CoreError::from(DbError::Database(SqlxError::PoolTimedOut));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_retryable());

        let err = CoreError::from(DbError::Database(SqlxError::ColumnNotFound(
            "title".to_string(),
        )));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.user_message().contains("title"));
    }

    #[test]
    fn test_conflict_message_targets_field() {
        let err = CoreError::Conflict {
            field: Some("title".to_string()),
            message: "UNIQUE constraint failed: releases.title".to_string(),
        };
        assert_eq!(err.field(), Some("title"));
        assert_eq!(err.user_message(), "This title is already in use");
    }

    #[test]
    fn test_join_table_conflict_names_linked_entity() {
        let message =
            "UNIQUE constraint failed: release_tracks.release_id, release_tracks.track_id";
        let err = CoreError::Conflict {
            field: unique_violation_field(message),
            message: message.to_string(),
        };
        assert_eq!(err.field(), Some("track"));
        assert_eq!(err.user_message(), "This track is already in use");
    }
}
