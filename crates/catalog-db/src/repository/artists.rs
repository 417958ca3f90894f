//! Artist and artist ↔ release association operations

use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::{Artist, ArtistRelease, NewArtist};
use crate::repository::Database;
use crate::utils::{BIND_CHUNK_SIZE, placeholders};

impl Database {
    // ==================== Artist Operations ====================

    /// Insert a new artist
    pub async fn insert_artist(&self, artist: NewArtist) -> Result<Artist, DbError> {
        let now = Utc::now();

        // Check if artist already exists
        if self.get_artist_by_name(&artist.name).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "Artist '{}' already exists",
                artist.name
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO artists (name, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&artist.name)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Artist {
            id,
            name: artist.name,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an artist by name
    pub async fn get_artist_by_name(&self, name: &str) -> Result<Option<Artist>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM artists
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Artist::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all artists
    pub async fn list_artists(&self) -> Result<Vec<Artist>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM artists
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Artist::try_from(row).map_err(DbError::from))
            .collect()
    }

    // ==================== Artist Release Operations ====================

    /// Get the artist links of a release
    pub async fn get_artist_releases(
        &self,
        release_id: i64,
    ) -> Result<Vec<ArtistRelease>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, artist_id, release_id
            FROM artist_releases
            WHERE release_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| ArtistRelease::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Link artists to a release
    ///
    /// Large batches are split into several inserts inside one transaction.
    /// An empty `artist_ids` slice issues no statement.
    pub async fn create_artist_releases(
        &self,
        release_id: i64,
        artist_ids: &[i64],
    ) -> Result<u64, DbError> {
        if artist_ids.is_empty() {
            return Ok(0);
        }

        debug!(
            "Linking {} artist(s) to release {}",
            artist_ids.len(),
            release_id
        );

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for chunk in artist_ids.chunks(BIND_CHUNK_SIZE) {
            let values = vec!["(?, ?, ?)"; chunk.len()].join(", ");
            let sql = format!(
                "INSERT INTO artist_releases (artist_id, release_id, created_at) VALUES {}",
                values
            );

            let mut query = sqlx::query(&sql);
            for artist_id in chunk {
                query = query.bind(*artist_id).bind(release_id).bind(now.clone());
            }
            created += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Delete artist links by join record id
    ///
    /// An empty `ids` slice issues no statement.
    pub async fn delete_artist_releases(&self, ids: &[i64]) -> Result<u64, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }

        debug!("Unlinking {} artist release record(s)", ids.len());

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for chunk in ids.chunks(BIND_CHUNK_SIZE) {
            let sql = format!(
                "DELETE FROM artist_releases WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(*id);
            }
            deleted += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }
}
