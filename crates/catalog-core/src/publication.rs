//! Release publication cascade
//!
//! Updating a release and, on its first publication, stamping every
//! still-unpublished linked track with the release's publish timestamp. Both
//! writes happen in one transaction.
//!
//! Whether the update is a first publication is decided from a read taken
//! before the transaction opens. That read is not isolated from concurrent
//! writers; the `published_on IS NULL` filter on the track update is what
//! keeps a duplicate cascade harmless.

use catalog_db::{CatalogStore, CatalogTransaction, Release, UpdateRelease};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Result of a release update
#[derive(Debug, Clone, Serialize)]
pub struct CascadeOutcome {
    /// The release as committed
    pub release: Release,
    /// Whether this update was the release's first publication
    pub cascaded: bool,
    /// Number of tracks whose `published_on` was set
    pub tracks_published: u64,
}

/// Applies release updates and the one-shot track publication cascade
pub struct PublicationCascade<S> {
    store: S,
}

impl<S: CatalogStore> PublicationCascade<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Update a release, cascading publication to its tracks if this update
    /// takes it from unpublished to published
    ///
    /// All-or-nothing: on error neither the release nor any track changes.
    pub async fn update_release(
        &self,
        id: i64,
        update: UpdateRelease,
    ) -> Result<CascadeOutcome, CoreError> {
        let current = self
            .store
            .find_release(id)
            .await?
            .filter(|release| !release.is_deleted())
            .ok_or_else(|| CoreError::NotFound(format!("Release {}", id)))?;
        let was_unpublished = !current.is_published();

        debug!(
            "Updating release {} (currently {})",
            id,
            if was_unpublished { "unpublished" } else { "published" }
        );

        let mut tx = self.store.begin().await?;

        match Self::apply(&mut tx, id, &update, was_unpublished).await {
            Ok(outcome) => {
                tx.commit().await?;

                if outcome.cascaded {
                    metrics::counter!("catalog_release_cascades_total").increment(1);
                    info!(
                        "Published release {}: {} track(s) published",
                        id, outcome.tracks_published
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback of release {} update failed: {}", id, rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Steps executed inside the transaction
    async fn apply(
        tx: &mut S::Tx,
        id: i64,
        update: &UpdateRelease,
        was_unpublished: bool,
    ) -> Result<CascadeOutcome, CoreError> {
        let updated = tx
            .update_release(id, update)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Release {}", id)))?;

        let publish_at = match updated.release.published_at {
            Some(at) if was_unpublished => at,
            _ => {
                return Ok(CascadeOutcome {
                    release: updated.release,
                    cascaded: false,
                    tracks_published: 0,
                });
            }
        };

        let tracks_published = if updated.track_ids.is_empty() {
            0
        } else {
            tx.publish_tracks(&updated.track_ids, publish_at).await?
        };

        Ok(CascadeOutcome {
            release: updated.release,
            cascaded: true,
            tracks_published,
        })
    }
}
