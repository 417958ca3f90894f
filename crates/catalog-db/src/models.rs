//! Database models

use crate::utils::{parse_datetime_or_now, parse_optional_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Release model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// `None` while the release is unpublished
    pub published_at: Option<DateTime<Utc>>,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Release {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_on.is_some()
    }
}

/// New release (for insertion)
#[derive(Debug, Clone, Default)]
pub struct NewRelease {
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Update release (for partial updates)
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct UpdateRelease {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub published_at: Option<Option<DateTime<Utc>>>,
}

/// A release row as returned from an in-transaction update, with the ids of
/// the tracks linked to it at that point in the transaction
#[derive(Debug, Clone)]
pub struct UpdatedRelease {
    pub release: Release,
    pub track_ids: Vec<i64>,
}

/// Published release listing row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedRelease {
    pub release: Release,
    pub artist_ids: Vec<i64>,
    pub track_count: i64,
}

/// Track model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub duration_secs: Option<i64>,
    /// Set once, by the publication cascade or explicitly at creation
    pub published_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New track (for insertion)
#[derive(Debug, Clone, Default)]
pub struct NewTrack {
    pub title: String,
    pub duration_secs: Option<i64>,
    pub published_on: Option<DateTime<Utc>>,
}

/// Artist model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New artist (for insertion)
#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
}

/// Artist ↔ release join record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistRelease {
    pub id: i64,
    pub artist_id: i64,
    pub release_id: i64,
}

/// Release ↔ track join record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseTrack {
    pub id: i64,
    pub release_id: i64,
    pub track_id: i64,
    pub position: i64,
}

/// New release track link (for insertion)
#[derive(Debug, Clone)]
pub struct NewReleaseTrack {
    pub release_id: i64,
    pub track_id: i64,
    pub position: i64,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for Release {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Release {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            published_at: parse_optional_datetime(row.try_get("published_at")?),
            deleted_on: parse_optional_datetime(row.try_get("deleted_on")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Track {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Track {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            duration_secs: row.try_get("duration_secs")?,
            published_on: parse_optional_datetime(row.try_get("published_on")?),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Artist {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Artist {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for ArtistRelease {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(ArtistRelease {
            id: row.try_get("id")?,
            artist_id: row.try_get("artist_id")?,
            release_id: row.try_get("release_id")?,
        })
    }
}
