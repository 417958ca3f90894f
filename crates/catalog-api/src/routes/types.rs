//! Request/Response DTOs

use catalog_core::{AssociationSync, ReleaseUpdateOutcome};
use catalog_db::Release;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ==================== Release Types ====================

/// Create release request
#[derive(Debug, Deserialize)]
pub struct CreateReleaseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Update release request
///
/// Omitted fields are left as they are; `null` clears `description` or
/// unpublishes via `published_at`. `artist_ids`, when present, is the complete
/// desired artist set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReleaseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub published_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub artist_ids: Option<Vec<i64>>,
}

/// Artist link changes made by a release update
#[derive(Debug, Serialize)]
pub struct AssociationsResponse {
    pub status: &'static str,
    pub created: u64,
    pub deleted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&AssociationSync> for AssociationsResponse {
    fn from(sync: &AssociationSync) -> Self {
        let (status, created, deleted, error) = match sync {
            AssociationSync::NotRequested => ("not_requested", 0, 0, None),
            AssociationSync::Unchanged => ("unchanged", 0, 0, None),
            AssociationSync::Applied { created, deleted } => ("applied", *created, *deleted, None),
            AssociationSync::Failed(e) => ("failed", 0, 0, Some(e.user_message())),
        };
        Self {
            status,
            created,
            deleted,
            error,
        }
    }
}

/// Update release response
#[derive(Debug, Serialize)]
pub struct UpdateReleaseResponse {
    pub release: Release,
    /// Whether this update published the release for the first time
    pub cascaded: bool,
    pub tracks_published: u64,
    pub associations: AssociationsResponse,
    /// The release was saved but its artist links were not
    pub partial: bool,
}

impl From<ReleaseUpdateOutcome> for UpdateReleaseResponse {
    fn from(outcome: ReleaseUpdateOutcome) -> Self {
        Self {
            partial: outcome.is_partial(),
            associations: AssociationsResponse::from(&outcome.associations),
            release: outcome.cascade.release,
            cascaded: outcome.cascade.cascaded,
            tracks_published: outcome.cascade.tracks_published,
        }
    }
}

/// Link track request
#[derive(Debug, Deserialize)]
pub struct LinkTrackRequest {
    pub track_id: i64,
    #[serde(default)]
    pub position: i64,
}

// ==================== Track Types ====================

/// Create track request
#[derive(Debug, Deserialize)]
pub struct CreateTrackRequest {
    pub title: String,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub published_on: Option<DateTime<Utc>>,
}

// ==================== Artist Types ====================

/// Create artist request
#[derive(Debug, Deserialize)]
pub struct CreateArtistRequest {
    pub name: String,
}

// ==================== Cache Types ====================

/// Cache statistics response
#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub entry_count: usize,
    pub keys: Vec<String>,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
    pub sweeper_running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let request: UpdateReleaseRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(request.description, Some(None));
        assert!(request.published_at.is_none());
        assert!(request.artist_ids.is_none());

        let request: UpdateReleaseRequest = serde_json::from_str(
            r#"{"published_at": "2024-05-01T12:00:00Z", "artist_ids": [3, 1]}"#,
        )
        .unwrap();
        assert!(matches!(request.published_at, Some(Some(_))));
        assert!(request.description.is_none());
        assert_eq!(request.artist_ids, Some(vec![3, 1]));
    }
}
