//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Whether this error is a UNIQUE constraint violation reported by SQLite
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Duplicate(_) => true,
            DbError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}
