//! Many-to-many association reconciliation
//!
//! Computes the minimal set of join-record deletions and creations that turn
//! the current links of an entity into a desired set of target ids. The
//! computation is pure; callers execute the resulting batches.

use std::collections::HashSet;

use catalog_db::{ArtistRelease, ReleaseTrack};

/// A join record linking an owner to one target entity
pub trait JoinRecord {
    /// Primary key of the join row (what gets deleted)
    fn join_id(&self) -> i64;

    /// Id of the linked entity (what gets compared against the desired set)
    fn target_id(&self) -> i64;
}

impl JoinRecord for ArtistRelease {
    fn join_id(&self) -> i64 {
        self.id
    }

    fn target_id(&self) -> i64 {
        self.artist_id
    }
}

impl JoinRecord for ReleaseTrack {
    fn join_id(&self) -> i64 {
        self.id
    }

    fn target_id(&self) -> i64 {
        self.track_id
    }
}

/// Mutations needed to reach the desired association set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationPlan {
    /// Join record ids whose target is no longer desired
    pub to_delete: Vec<i64>,
    /// Target ids that are desired but not linked yet
    pub to_create: Vec<i64>,
}

impl AssociationPlan {
    /// Whether no writes are needed
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// Diff `current` join records against the `desired` target ids
///
/// Order and duplicates in `desired` are irrelevant to what gets deleted;
/// `to_create` keeps the first-occurrence order of `desired` without
/// duplicates. If the current targets already equal the desired set, the
/// plan is empty.
pub fn reconcile<J: JoinRecord>(current: &[J], desired: &[i64]) -> AssociationPlan {
    let wanted: HashSet<i64> = desired.iter().copied().collect();
    let linked: HashSet<i64> = current.iter().map(JoinRecord::target_id).collect();

    let to_delete = current
        .iter()
        .filter(|record| !wanted.contains(&record.target_id()))
        .map(JoinRecord::join_id)
        .collect();

    let mut seen = HashSet::new();
    let to_create = desired
        .iter()
        .copied()
        .filter(|id| !linked.contains(id) && seen.insert(*id))
        .collect();

    AssociationPlan {
        to_delete,
        to_create,
    }
}
