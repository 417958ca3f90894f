//! Catalog service
//!
//! Entry point for the HTTP layer. Writes go through the publication cascade
//! and invalidate the cache entries they affect; public reads are served
//! through the read-through cache.

use std::sync::Arc;
use std::time::Duration;

use catalog_db::{
    Artist, CatalogStore, Database, NewArtist, NewRelease, NewReleaseTrack, NewTrack,
    PublishedRelease, Release, ReleaseTrack, Track, UpdateRelease,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::associations::reconcile;
use crate::cache::TtlCache;
use crate::error::CoreError;
use crate::publication::{CascadeOutcome, PublicationCascade};

const PUBLISHED_KEY: &str = "releases:published";
const ARTISTS_KEY: &str = "artists";

fn detail_key(id: i64) -> String {
    format!("releases:{}", id)
}

/// TTL per cached read path. A zero TTL disables caching for that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub published: Duration,
    pub detail: Duration,
    pub artists: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            published: Duration::from_secs(600),
            detail: Duration::from_secs(300),
            artists: Duration::from_secs(300),
        }
    }
}

impl CacheTtls {
    /// Every read goes to the database
    pub fn disabled() -> Self {
        Self {
            published: Duration::ZERO,
            detail: Duration::ZERO,
            artists: Duration::ZERO,
        }
    }
}

/// A release with its tracks (in position order) and artist ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDetail {
    pub release: Release,
    pub tracks: Vec<Track>,
    pub artist_ids: Vec<i64>,
}

/// Release update as submitted by a client
#[derive(Debug, Clone, Default)]
pub struct ReleaseUpdateRequest {
    pub fields: UpdateRelease,
    /// Complete desired artist set; `None` leaves the links untouched
    pub artist_ids: Option<Vec<i64>>,
}

/// Result of synchronizing a release's artist links
#[derive(Debug, Clone)]
pub enum AssociationSync {
    /// The request did not carry an artist list
    NotRequested,
    /// The links already matched
    Unchanged,
    Applied { created: u64, deleted: u64 },
    /// The release update committed but the links could not be updated
    Failed(CoreError),
}

#[derive(Debug, Clone)]
pub struct ReleaseUpdateOutcome {
    pub cascade: CascadeOutcome,
    pub associations: AssociationSync,
}

impl ReleaseUpdateOutcome {
    /// The release was saved but its artist links were not
    pub fn is_partial(&self) -> bool {
        matches!(self.associations, AssociationSync::Failed(_))
    }
}

/// Catalog operations with caching and cache invalidation
pub struct CatalogService {
    db: Database,
    cache: Arc<TtlCache>,
    ttls: CacheTtls,
    cascade: PublicationCascade<Database>,
}

impl CatalogService {
    /// Create a new catalog service
    pub fn new(db: Database, cache: Arc<TtlCache>, ttls: CacheTtls) -> Self {
        Self {
            cascade: PublicationCascade::new(db.clone()),
            db,
            cache,
            ttls,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    // ==================== Release Operations ====================

    /// Update a release, cascading publication to its tracks, then bring its
    /// artist links in line with the request
    ///
    /// The link update runs after the release transaction commits. If it
    /// fails the release changes stand and the outcome is partial.
    pub async fn update_release(
        &self,
        id: i64,
        request: ReleaseUpdateRequest,
    ) -> Result<ReleaseUpdateOutcome, CoreError> {
        let cascade = self.cascade.update_release(id, request.fields).await?;

        let associations = match request.artist_ids {
            None => AssociationSync::NotRequested,
            Some(artist_ids) => match self.sync_artists(id, &artist_ids).await {
                Ok(sync) => sync,
                Err(e) => {
                    warn!("Artist links of release {} were not updated: {}", id, e);
                    metrics::counter!("catalog_association_sync_failures_total").increment(1);
                    AssociationSync::Failed(e)
                }
            },
        };

        self.invalidate_release(id);

        Ok(ReleaseUpdateOutcome {
            cascade,
            associations,
        })
    }

    async fn sync_artists(
        &self,
        id: i64,
        artist_ids: &[i64],
    ) -> Result<AssociationSync, CoreError> {
        let current = self.db.find_associations(id).await?;
        let plan = reconcile(&current, artist_ids);

        if plan.is_empty() {
            debug!("Artist links of release {} unchanged", id);
            return Ok(AssociationSync::Unchanged);
        }

        let (deleted, created) = futures::try_join!(
            async {
                if plan.to_delete.is_empty() {
                    Ok(0)
                } else {
                    self.db.delete_associations(&plan.to_delete).await
                }
            },
            async {
                if plan.to_create.is_empty() {
                    Ok(0)
                } else {
                    self.db.create_associations(id, &plan.to_create).await
                }
            },
        )?;

        info!(
            "Updated artist links of release {}: {} created, {} deleted",
            id, created, deleted
        );
        Ok(AssociationSync::Applied { created, deleted })
    }

    /// Create a release
    pub async fn create_release(&self, release: NewRelease) -> Result<Release, CoreError> {
        let release = self.db.insert_release(release).await?;
        info!("Created release {}: {}", release.id, release.title);

        if release.is_published() {
            self.cache.delete_prefix(PUBLISHED_KEY);
        }
        Ok(release)
    }

    /// Soft-delete a release
    pub async fn delete_release(&self, id: i64) -> Result<(), CoreError> {
        if !self.db.soft_delete_release(id).await? {
            return Err(CoreError::NotFound(format!("Release {}", id)));
        }
        info!("Deleted release {}", id);

        self.invalidate_release(id);
        Ok(())
    }

    /// Published releases, newest first (cached)
    pub async fn published_releases(&self) -> Result<Vec<PublishedRelease>, CoreError> {
        self.cache
            .with_cache(
                PUBLISHED_KEY,
                || async { self.db.list_published_releases().await.map_err(CoreError::from) },
                self.ttls.published,
            )
            .await
    }

    /// A live release with its tracks and artists (cached)
    pub async fn release_detail(&self, id: i64) -> Result<ReleaseDetail, CoreError> {
        self.cache
            .with_cache(
                &detail_key(id),
                || self.load_release_detail(id),
                self.ttls.detail,
            )
            .await
    }

    async fn load_release_detail(&self, id: i64) -> Result<ReleaseDetail, CoreError> {
        let release = self
            .db
            .get_release(id)
            .await?
            .filter(|release| !release.is_deleted())
            .ok_or_else(|| CoreError::NotFound(format!("Release {}", id)))?;

        let tracks = self.db.list_release_tracks(id).await?;
        let artist_ids = self
            .db
            .get_artist_releases(id)
            .await?
            .into_iter()
            .map(|link| link.artist_id)
            .collect();

        Ok(ReleaseDetail {
            release,
            tracks,
            artist_ids,
        })
    }

    // ==================== Track Operations ====================

    /// Create a track
    pub async fn create_track(&self, track: NewTrack) -> Result<Track, CoreError> {
        let track = self.db.insert_track(track).await?;
        info!("Created track {}: {}", track.id, track.title);
        Ok(track)
    }

    /// Link an existing track to a live release
    pub async fn link_track(
        &self,
        release_id: i64,
        track_id: i64,
        position: i64,
    ) -> Result<ReleaseTrack, CoreError> {
        self.db
            .get_release(release_id)
            .await?
            .filter(|release| !release.is_deleted())
            .ok_or_else(|| CoreError::NotFound(format!("Release {}", release_id)))?;
        self.db
            .get_track(track_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Track {}", track_id)))?;

        let link = self
            .db
            .link_release_track(NewReleaseTrack {
                release_id,
                track_id,
                position,
            })
            .await?;
        debug!("Linked track {} to release {}", track_id, release_id);

        self.invalidate_release(release_id);
        Ok(link)
    }

    // ==================== Artist Operations ====================

    /// Create an artist
    pub async fn create_artist(&self, name: String) -> Result<Artist, CoreError> {
        let artist = self.db.insert_artist(NewArtist { name }).await?;
        info!("Created artist {}: {}", artist.id, artist.name);

        self.cache.delete(ARTISTS_KEY);
        Ok(artist)
    }

    /// All artists by name (cached)
    pub async fn list_artists(&self) -> Result<Vec<Artist>, CoreError> {
        self.cache
            .with_cache(
                ARTISTS_KEY,
                || async { self.db.list_artists().await.map_err(CoreError::from) },
                self.ttls.artists,
            )
            .await
    }

    fn invalidate_release(&self, id: i64) {
        self.cache.delete(&detail_key(id));
        self.cache.delete_prefix(PUBLISHED_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;

    async fn service() -> CatalogService {
        let db = Database::in_memory().await.unwrap();
        CatalogService::new(db, Arc::new(TtlCache::new()), CacheTtls::default())
    }

    async fn draft(service: &CatalogService, title: &str) -> Release {
        service
            .create_release(NewRelease {
                title: title.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn with_artists(artist_ids: Vec<i64>) -> ReleaseUpdateRequest {
        ReleaseUpdateRequest {
            fields: UpdateRelease::default(),
            artist_ids: Some(artist_ids),
        }
    }

    #[tokio::test]
    async fn test_artist_sync_outcomes() {
        let service = service().await;
        let release = draft(&service, "Geogaddi").await;
        let a = service.create_artist("Boards of Canada".to_string()).await.unwrap();
        let b = service.create_artist("Bola".to_string()).await.unwrap();
        let c = service.create_artist("Gescom".to_string()).await.unwrap();

        let outcome = service
            .update_release(release.id, with_artists(vec![a.id, b.id]))
            .await
            .unwrap();
        assert!(matches!(
            outcome.associations,
            AssociationSync::Applied { created: 2, deleted: 0 }
        ));

        let outcome = service
            .update_release(release.id, with_artists(vec![b.id, a.id]))
            .await
            .unwrap();
        assert!(matches!(outcome.associations, AssociationSync::Unchanged));

        let outcome = service
            .update_release(release.id, with_artists(vec![b.id, c.id]))
            .await
            .unwrap();
        assert!(matches!(
            outcome.associations,
            AssociationSync::Applied { created: 1, deleted: 1 }
        ));

        let outcome = service
            .update_release(release.id, ReleaseUpdateRequest::default())
            .await
            .unwrap();
        assert!(matches!(outcome.associations, AssociationSync::NotRequested));
        assert!(!outcome.is_partial());

        let mut artist_ids = service.release_detail(release.id).await.unwrap().artist_ids;
        artist_ids.sort();
        assert_eq!(artist_ids, vec![b.id, c.id]);
    }

    #[tokio::test]
    async fn test_failed_artist_sync_is_partial() {
        let service = service().await;
        let release = draft(&service, "Untrue").await;

        let outcome = service
            .update_release(
                release.id,
                ReleaseUpdateRequest {
                    fields: UpdateRelease {
                        published_at: Some(Some(Utc::now())),
                        ..Default::default()
                    },
                    // No such artist
                    artist_ids: Some(vec![9999]),
                },
            )
            .await
            .unwrap();

        assert!(outcome.is_partial());
        assert!(outcome.cascade.cascaded);

        // The release change itself committed
        let detail = service.release_detail(release.id).await.unwrap();
        assert!(detail.release.is_published());
        assert!(detail.artist_ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_reads() {
        let service = service().await;
        let release = draft(&service, "Music Has the Right to Children").await;

        // Prime both entries
        assert!(service.published_releases().await.unwrap().is_empty());
        assert!(!service.release_detail(release.id).await.unwrap().release.is_published());

        service
            .update_release(
                release.id,
                ReleaseUpdateRequest {
                    fields: UpdateRelease {
                        published_at: Some(Some(Utc::now())),
                        ..Default::default()
                    },
                    artist_ids: None,
                },
            )
            .await
            .unwrap();

        let published = service.published_releases().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].release.id, release.id);
        assert!(service.release_detail(release.id).await.unwrap().release.is_published());
    }

    #[tokio::test]
    async fn test_reads_are_served_from_cache() {
        let db = Database::in_memory().await.unwrap();
        let service =
            CatalogService::new(db.clone(), Arc::new(TtlCache::new()), CacheTtls::default());

        service.create_artist("Autechre".to_string()).await.unwrap();
        assert_eq!(service.list_artists().await.unwrap().len(), 1);

        // A write that bypasses the service is not visible until the entry is invalidated
        db.insert_artist(NewArtist {
            name: "Plaid".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(service.list_artists().await.unwrap().len(), 1);

        service.create_artist("Seefeel".to_string()).await.unwrap();
        assert_eq!(service.list_artists().await.unwrap().len(), 3);

        let stats = service.cache().stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 2);
    }

    #[tokio::test]
    async fn test_disabled_ttls_always_read_through() {
        let db = Database::in_memory().await.unwrap();
        let service =
            CatalogService::new(db.clone(), Arc::new(TtlCache::new()), CacheTtls::disabled());

        assert!(service.list_artists().await.unwrap().is_empty());
        db.insert_artist(NewArtist {
            name: "Squarepusher".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(service.list_artists().await.unwrap().len(), 1);
        assert_eq!(service.cache().stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_link_and_delete_release() {
        let service = service().await;
        let release = service
            .create_release(NewRelease {
                title: "Tri Repetae".to_string(),
                description: None,
                published_at: Some(Utc::now()),
            })
            .await
            .unwrap();
        let track = service
            .create_track(NewTrack {
                title: "Dael".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(service.published_releases().await.unwrap()[0].track_count, 0);

        service.link_track(release.id, track.id, 1).await.unwrap();
        assert_eq!(service.published_releases().await.unwrap()[0].track_count, 1);
        assert_eq!(service.release_detail(release.id).await.unwrap().tracks.len(), 1);

        let err = service.link_track(release.id, track.id + 1, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        service.delete_release(release.id).await.unwrap();
        assert!(service.published_releases().await.unwrap().is_empty());
        assert_eq!(
            service.release_detail(release.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service.delete_release(release.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_duplicate_artist_is_conflict() {
        let service = service().await;
        service.create_artist("Aphex Twin".to_string()).await.unwrap();

        let err = service.create_artist("Aphex Twin".to_string()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_track_link_is_conflict_on_track() {
        let service = service().await;
        let release = draft(&service, "Selected Ambient Works").await;
        let track = service
            .create_track(NewTrack {
                title: "Xtal".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        service.link_track(release.id, track.id, 1).await.unwrap();
        let err = service.link_track(release.id, track.id, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.field(), Some("track"));
        assert_eq!(err.user_message(), "This track is already in use");
    }
}
