//! Halo record store
//!
//! Read-only, typed view over the merger graph: one map per snapshot from
//! halo id to [`HaloRecord`], addressed by `(snapshot, halo id)`.

mod record;

pub use record::{HaloId, HaloRecord, Link, LinkSide, RecordError};

use std::collections::BTreeMap;

use thiserror::Error;

use crate::snapshot::{SnapshotId, SnapshotIndex};

/// Errors raised by the record store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// The `(snapshot, halo)` pair does not exist.
    #[error("halo {halo_id} not found at snapshot {snapshot}")]
    KeyNotFound {
        /// Snapshot that was searched.
        snapshot: SnapshotId,
        /// Halo that was requested.
        halo_id: HaloId,
    },

    /// A record's fields contradict each other.
    #[error("halo {halo_id} at snapshot {snapshot} is inconsistent: {source}")]
    Inconsistent {
        /// Snapshot holding the record.
        snapshot: SnapshotId,
        /// Offending halo.
        halo_id: HaloId,
        /// What disagreed.
        source: RecordError,
    },

    /// The tree holds halos at a snapshot the index does not know.
    #[error("tree holds halos at snapshot {ordinal:03} beyond the last indexed snapshot {latest}")]
    SnapshotOutOfRange {
        /// Ordinal of the snapshot holding halos.
        ordinal: usize,
        /// Last snapshot of the index.
        latest: SnapshotId,
    },
}

/// Merger graph keyed by snapshot and halo id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergerTree {
    snapshots: Vec<BTreeMap<HaloId, HaloRecord>>,
}

impl MergerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(
        &mut self,
        snapshot: SnapshotId,
        halo_id: HaloId,
        record: HaloRecord,
    ) -> Option<HaloRecord> {
        let slot = snapshot.ordinal();
        if self.snapshots.len() <= slot {
            self.snapshots.resize_with(slot + 1, BTreeMap::new);
        }
        self.snapshots[slot].insert(halo_id, record)
    }

    /// Look up a record.
    pub fn get(&self, snapshot: SnapshotId, halo_id: HaloId) -> Result<&HaloRecord, TreeError> {
        self.snapshots
            .get(snapshot.ordinal())
            .and_then(|halos| halos.get(&halo_id))
            .ok_or(TreeError::KeyNotFound { snapshot, halo_id })
    }

    /// Halos of one snapshot in ascending id order; empty if none exist.
    pub fn halos_at(
        &self,
        snapshot: SnapshotId,
    ) -> impl Iterator<Item = (HaloId, &HaloRecord)> + '_ {
        self.snapshots
            .get(snapshot.ordinal())
            .into_iter()
            .flat_map(|halos| halos.iter().map(|(&id, record)| (id, record)))
    }

    /// Number of halos stored at a snapshot.
    pub fn count_at(&self, snapshot: SnapshotId) -> usize {
        self.snapshots
            .get(snapshot.ordinal())
            .map_or(0, BTreeMap::len)
    }

    /// Total number of halo records.
    pub fn len(&self) -> usize {
        self.snapshots.iter().map(BTreeMap::len).sum()
    }

    /// Whether the tree holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every populated snapshot belongs to the index.
    pub fn check_range(&self, index: &SnapshotIndex) -> Result<(), TreeError> {
        let latest = index.latest();
        for (ordinal, halos) in self.snapshots.iter().enumerate() {
            if ordinal > latest.ordinal() && !halos.is_empty() {
                return Err(TreeError::SnapshotOutOfRange { ordinal, latest });
            }
        }
        Ok(())
    }
}
