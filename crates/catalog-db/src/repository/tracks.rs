//! Track operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewReleaseTrack, NewTrack, ReleaseTrack, Track};
use crate::repository::Database;
use crate::utils::format_optional_datetime;

impl Database {
    // ==================== Track Operations ====================

    /// Insert a new track
    pub async fn insert_track(&self, track: NewTrack) -> Result<Track, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tracks (title, duration_secs, published_on, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&track.title)
        .bind(track.duration_secs)
        .bind(format_optional_datetime(track.published_on))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Track {
            id,
            title: track.title,
            duration_secs: track.duration_secs,
            published_on: track.published_on,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a track by ID
    pub async fn get_track(&self, id: i64) -> Result<Option<Track>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, title, duration_secs, published_on, created_at, updated_at
            FROM tracks
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Track::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List the tracks of a release in tracklist order
    pub async fn list_release_tracks(&self, release_id: i64) -> Result<Vec<Track>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.title, t.duration_secs, t.published_on, t.created_at, t.updated_at
            FROM tracks t
            JOIN release_tracks rt ON rt.track_id = t.id
            WHERE rt.release_id = ?
            ORDER BY rt.position ASC, rt.id ASC
            "#,
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Track::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Release Track Operations ====================

    /// Link a track to a release
    pub async fn link_release_track(&self, link: NewReleaseTrack) -> Result<ReleaseTrack, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO release_tracks (release_id, track_id, position, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(link.release_id)
        .bind(link.track_id)
        .bind(link.position)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(ReleaseTrack {
            id,
            release_id: link.release_id,
            track_id: link.track_id,
            position: link.position,
        })
    }
}
