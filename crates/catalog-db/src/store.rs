//! Repository boundary for the publication engine
//!
//! [`CatalogStore`] and [`CatalogTransaction`] are the only persistence
//! operations the release-publication logic depends on. [`Database`]
//! implements them on SQLite; tests may wrap or replace them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Sqlite;
use tracing::debug;

use crate::error::DbError;
use crate::models::{ArtistRelease, Release, UpdateRelease, UpdatedRelease};
use crate::repository::{Database, fetch_release, fetch_release_track_ids};
use crate::utils::{BIND_CHUNK_SIZE, format_optional_datetime, placeholders};

/// Store operations used by the publication engine
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Transaction handle returned by [`CatalogStore::begin`]
    type Tx: CatalogTransaction;

    /// Read a release outside of any transaction
    async fn find_release(&self, id: i64) -> Result<Option<Release>, DbError>;

    /// Open a transaction
    async fn begin(&self) -> Result<Self::Tx, DbError>;

    /// Current artist links of a release
    async fn find_associations(&self, release_id: i64) -> Result<Vec<ArtistRelease>, DbError>;

    /// Create one link per artist id
    async fn create_associations(
        &self,
        release_id: i64,
        artist_ids: &[i64],
    ) -> Result<u64, DbError>;

    /// Delete links by join record id
    async fn delete_associations(&self, ids: &[i64]) -> Result<u64, DbError>;
}

/// Operations available inside an open transaction
///
/// Dropping a transaction without calling [`CatalogTransaction::commit`]
/// rolls it back.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Apply field updates to a live (not soft-deleted) release
    ///
    /// Returns `None` when no such release exists.
    async fn update_release(
        &mut self,
        id: i64,
        update: &UpdateRelease,
    ) -> Result<Option<UpdatedRelease>, DbError>;

    /// Set `published_on` on every listed track whose `published_on` is NULL
    ///
    /// Returns the number of tracks changed. An empty `track_ids` slice
    /// issues no statement.
    async fn publish_tracks(
        &mut self,
        track_ids: &[i64],
        published_on: DateTime<Utc>,
    ) -> Result<u64, DbError>;

    async fn commit(self) -> Result<(), DbError>;

    async fn rollback(self) -> Result<(), DbError>;
}

/// SQLite transaction handle
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl CatalogTransaction for SqliteTransaction {
    async fn update_release(
        &mut self,
        id: i64,
        update: &UpdateRelease,
    ) -> Result<Option<UpdatedRelease>, DbError> {
        let now = Utc::now();

        // Build dynamic update query
        let mut updates = vec!["updated_at = ?"];
        if update.title.is_some() {
            updates.push("title = ?");
        }
        if update.description.is_some() {
            updates.push("description = ?");
        }
        if update.published_at.is_some() {
            updates.push("published_at = ?");
        }

        let sql = format!(
            "UPDATE releases SET {} WHERE id = ? AND deleted_on IS NULL",
            updates.join(", ")
        );
        let mut query = sqlx::query(&sql).bind(now.to_rfc3339());

        // Bind optional fields in the same order as updates
        if let Some(ref v) = update.title {
            query = query.bind(v.clone());
        }
        if let Some(ref v) = update.description {
            query = query.bind(v.clone());
        }
        if let Some(v) = update.published_at {
            query = query.bind(format_optional_datetime(v));
        }
        query = query.bind(id);

        let result = query.execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let release = fetch_release(&mut *self.tx, id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Release {}", id)))?;
        let track_ids = fetch_release_track_ids(&mut *self.tx, id).await?;

        Ok(Some(UpdatedRelease { release, track_ids }))
    }

    async fn publish_tracks(
        &mut self,
        track_ids: &[i64],
        published_on: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        if track_ids.is_empty() {
            return Ok(0);
        }

        let published_on = published_on.to_rfc3339();
        let now = Utc::now().to_rfc3339();
        let mut published = 0;

        for chunk in track_ids.chunks(BIND_CHUNK_SIZE) {
            let sql = format!(
                "UPDATE tracks SET published_on = ?, updated_at = ? \
                 WHERE published_on IS NULL AND id IN ({})",
                placeholders(chunk.len())
            );
            let mut query = sqlx::query(&sql)
                .bind(published_on.as_str())
                .bind(now.as_str());
            for id in chunk {
                query = query.bind(*id);
            }
            published += query.execute(&mut *self.tx).await?.rows_affected();
        }

        debug!(
            "Published {} of {} linked track(s)",
            published,
            track_ids.len()
        );
        Ok(published)
    }

    async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DbError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for Database {
    type Tx = SqliteTransaction;

    async fn find_release(&self, id: i64) -> Result<Option<Release>, DbError> {
        self.get_release(id).await
    }

    async fn begin(&self) -> Result<Self::Tx, DbError> {
        let tx = self.pool().begin().await?;
        Ok(SqliteTransaction { tx })
    }

    async fn find_associations(&self, release_id: i64) -> Result<Vec<ArtistRelease>, DbError> {
        self.get_artist_releases(release_id).await
    }

    async fn create_associations(
        &self,
        release_id: i64,
        artist_ids: &[i64],
    ) -> Result<u64, DbError> {
        self.create_artist_releases(release_id, artist_ids).await
    }

    async fn delete_associations(&self, ids: &[i64]) -> Result<u64, DbError> {
        self.delete_artist_releases(ids).await
    }
}
