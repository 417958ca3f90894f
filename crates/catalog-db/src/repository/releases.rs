//! Release operations

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, Sqlite};

use crate::error::DbError;
use crate::models::{NewRelease, PublishedRelease, Release};
use crate::repository::Database;
use crate::utils::format_optional_datetime;

const RELEASE_COLUMNS: &str =
    "id, title, description, published_at, deleted_on, created_at, updated_at";

/// Fetch a single release row on any executor (pool or open transaction)
pub(crate) async fn fetch_release<'e, E>(executor: E, id: i64) -> Result<Option<Release>, DbError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM releases WHERE id = ?", RELEASE_COLUMNS);
    let result = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;

    result
        .map(|row| Release::try_from(&row).map_err(DbError::from))
        .transpose()
}

/// Fetch the ids of all tracks linked to a release, in tracklist order
pub(crate) async fn fetch_release_track_ids<'e, E>(
    executor: E,
    release_id: i64,
) -> Result<Vec<i64>, DbError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT track_id
        FROM release_tracks
        WHERE release_id = ?
        ORDER BY position ASC, id ASC
        "#,
    )
    .bind(release_id)
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(|row| row.try_get("track_id").map_err(DbError::from))
        .collect()
}

impl Database {
    // ==================== Release Operations ====================

    /// Insert a new release
    pub async fn insert_release(&self, release: NewRelease) -> Result<Release, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO releases
                (title, description, published_at, deleted_on, created_at, updated_at)
            VALUES (?, ?, ?, NULL, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&release.title)
        .bind(&release.description)
        .bind(format_optional_datetime(release.published_at))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Release {
            id,
            title: release.title,
            description: release.description,
            published_at: release.published_at,
            deleted_on: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a release by ID, including soft-deleted ones
    pub async fn get_release(&self, id: i64) -> Result<Option<Release>, DbError> {
        fetch_release(&self.pool, id).await
    }

    /// List published, non-deleted releases (newest first) with their
    /// artist ids and track counts
    pub async fn list_published_releases(&self) -> Result<Vec<PublishedRelease>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.title, r.description, r.published_at, r.deleted_on,
                   r.created_at, r.updated_at,
                   (SELECT COUNT(*) FROM release_tracks rt WHERE rt.release_id = r.id)
                       AS track_count
            FROM releases r
            WHERE r.published_at IS NOT NULL AND r.deleted_on IS NULL
            ORDER BY r.published_at DESC, r.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut listing = Vec::with_capacity(rows.len());
        for row in &rows {
            listing.push(PublishedRelease {
                release: Release::try_from(row)?,
                artist_ids: Vec::new(),
                track_count: row.try_get("track_count")?,
            });
        }

        if listing.is_empty() {
            return Ok(listing);
        }

        let rows = sqlx::query(
            r#"
            SELECT release_id, artist_id
            FROM artist_releases
            WHERE release_id IN (
                SELECT id FROM releases WHERE published_at IS NOT NULL AND deleted_on IS NULL
            )
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut artists: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in &rows {
            let release_id: i64 = row.try_get("release_id")?;
            let artist_id: i64 = row.try_get("artist_id")?;
            artists.entry(release_id).or_default().push(artist_id);
        }

        for entry in &mut listing {
            if let Some(ids) = artists.remove(&entry.release.id) {
                entry.artist_ids = ids;
            }
        }

        Ok(listing)
    }

    /// Soft-delete a release
    ///
    /// Returns `false` when the release does not exist or is already deleted.
    pub async fn soft_delete_release(&self, id: i64) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE releases
            SET deleted_on = ?, updated_at = ?
            WHERE id = ? AND deleted_on IS NULL
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewArtist, NewTrack};
    use chrono::Duration;

    #[tokio::test]
    async fn test_insert_and_get_release() {
        let db = Database::in_memory().await.unwrap();
        let created = db
            .insert_release(NewRelease {
                title: "Night Drive".to_string(),
                description: Some("Synth record".to_string()),
                published_at: None,
            })
            .await
            .unwrap();

        let fetched = db.get_release(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Night Drive");
        assert_eq!(fetched.description.as_deref(), Some("Synth record"));
        assert!(!fetched.is_published());
        assert!(!fetched.is_deleted());

        assert!(db.get_release(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_title_is_unique_violation() {
        let db = Database::in_memory().await.unwrap();
        let new = NewRelease {
            title: "Same".to_string(),
            ..Default::default()
        };
        db.insert_release(new.clone()).await.unwrap();

        let err = db.insert_release(new).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_list_published_releases() {
        let db = Database::in_memory().await.unwrap();
        let now = Utc::now();

        let older = db
            .insert_release(NewRelease {
                title: "Older".to_string(),
                published_at: Some(now - Duration::days(2)),
                ..Default::default()
            })
            .await
            .unwrap();
        let newer = db
            .insert_release(NewRelease {
                title: "Newer".to_string(),
                published_at: Some(now),
                ..Default::default()
            })
            .await
            .unwrap();
        db.insert_release(NewRelease {
            title: "Draft".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        let deleted = db
            .insert_release(NewRelease {
                title: "Deleted".to_string(),
                published_at: Some(now),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(db.soft_delete_release(deleted.id).await.unwrap());

        let artist = db
            .insert_artist(NewArtist {
                name: "Tycho".to_string(),
            })
            .await
            .unwrap();
        db.create_artist_releases(newer.id, &[artist.id]).await.unwrap();

        let track = db
            .insert_track(NewTrack {
                title: "Intro".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.link_release_track(crate::models::NewReleaseTrack {
            release_id: older.id,
            track_id: track.id,
            position: 1,
        })
        .await
        .unwrap();

        let listing = db.list_published_releases().await.unwrap();
        let titles: Vec<&str> = listing.iter().map(|p| p.release.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
        assert_eq!(listing[0].artist_ids, vec![artist.id]);
        assert_eq!(listing[0].track_count, 0);
        assert!(listing[1].artist_ids.is_empty());
        assert_eq!(listing[1].track_count, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let release = db
            .insert_release(NewRelease {
                title: "Gone".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(db.soft_delete_release(release.id).await.unwrap());
        assert!(!db.soft_delete_release(release.id).await.unwrap());

        let fetched = db.get_release(release.id).await.unwrap().unwrap();
        assert!(fetched.is_deleted());
    }

    #[tokio::test]
    async fn test_list_published_releases_beyond_bind_limit() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query(
            r#"
            WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 33000)
            INSERT INTO releases
                (title, description, published_at, deleted_on, created_at, updated_at)
            SELECT 'Release ' || n, NULL, '2024-01-01T00:00:00+00:00', NULL,
                   '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00'
            FROM seq
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let artist = db
            .insert_artist(NewArtist {
                name: "Prolific".to_string(),
            })
            .await
            .unwrap();
        db.create_artist_releases(1, &[artist.id]).await.unwrap();

        let listing = db.list_published_releases().await.unwrap();
        assert_eq!(listing.len(), 33000);

        let first = listing.iter().find(|p| p.release.id == 1).unwrap();
        assert_eq!(first.artist_ids, vec![artist.id]);
        assert_eq!(listing.iter().filter(|p| !p.artist_ids.is_empty()).count(), 1);
    }
}
