//! Main-branch walker
//!
//! Starting from a halo (normally at the latest snapshot), follow the most
//! massive progenitor one snapshot back at a time until a halo without
//! progenitors is reached. The walk is lazy: each call to `next` performs
//! exactly one record lookup.
//!
//! Mass cutoffs are not applied here. Every halo of the lineage
//! is visited; callers decide which steps contribute a statistic.

use std::iter::FusedIterator;

use thiserror::Error;

use crate::mergertree::{HaloId, HaloRecord, MergerTree};
use crate::snapshot::{SnapshotId, SnapshotIndex};

/// Errors that end a lineage early.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraversalError {
    /// A progenitor link points at a record that does not exist.
    #[error("halo {halo_id} at snapshot {snapshot} is referenced but not present")]
    KeyNotFound {
        /// Snapshot that was searched.
        snapshot: SnapshotId,
        /// Missing halo.
        halo_id: HaloId,
    },

    /// Progenitors remain but there is no earlier snapshot to step into.
    #[error("halo {halo_id} at snapshot {snapshot} lists {n_prog} progenitors but no earlier snapshot exists")]
    InvalidTraversal {
        /// Snapshot of the halo.
        snapshot: SnapshotId,
        /// Halo whose progenitors could not be followed.
        halo_id: HaloId,
        /// Number of listed progenitors.
        n_prog: usize,
    },
}

/// One halo visited along a main branch.
#[derive(Debug, Clone, Copy)]
pub struct BranchStep<'a> {
    /// Snapshot of the visited halo.
    pub snapshot: SnapshotId,
    /// Identifier of the visited halo.
    pub halo_id: HaloId,
    /// Record of the visited halo.
    pub record: &'a HaloRecord,
}

#[derive(Debug, Clone)]
enum Cursor {
    At(SnapshotId, HaloId),
    Failed(TraversalError),
    Done,
}

/// Lazy main-branch iterator.
///
/// Yields steps with strictly decreasing snapshot ordinals (gap of exactly
/// one). Ends after a halo with `nProg == 0`, or after yielding a single
/// error. Restart by calling [`MainBranch::walk`] again with the same root.
#[derive(Debug, Clone)]
pub struct MainBranch<'a> {
    tree: &'a MergerTree,
    index: &'a SnapshotIndex,
    root: (SnapshotId, HaloId),
    cursor: Cursor,
}

impl<'a> MainBranch<'a> {
    /// Begin a walk at `(root_snapshot, root_id)`.
    pub fn walk(
        tree: &'a MergerTree,
        index: &'a SnapshotIndex,
        root_snapshot: SnapshotId,
        root_id: HaloId,
    ) -> Self {
        Self {
            tree,
            index,
            root: (root_snapshot, root_id),
            cursor: Cursor::At(root_snapshot, root_id),
        }
    }

    /// Snapshot and id the walk started from.
    pub fn root(&self) -> (SnapshotId, HaloId) {
        self.root
    }

    /// Drain the walk, returning the visited `(snapshot, halo)` pairs.
    pub fn into_path(self) -> Result<Vec<(SnapshotId, HaloId)>, TraversalError> {
        self.map(|step| step.map(|s| (s.snapshot, s.halo_id)))
            .collect()
    }
}

impl<'a> Iterator for MainBranch<'a> {
    type Item = Result<BranchStep<'a>, TraversalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (snapshot, halo_id) = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::At(snapshot, halo_id) => (snapshot, halo_id),
            Cursor::Failed(err) => return Some(Err(err)),
            Cursor::Done => return None,
        };

        let record = match self.tree.get(snapshot, halo_id) {
            Ok(record) => record,
            Err(_) => return Some(Err(TraversalError::KeyNotFound { snapshot, halo_id })),
        };

        if let Some(progenitor) = record.main_progenitor() {
            self.cursor = match self.index.previous(snapshot) {
                Some(previous) => Cursor::At(previous, progenitor.id),
                None => Cursor::Failed(TraversalError::InvalidTraversal {
                    snapshot,
                    halo_id,
                    n_prog: record.n_prog(),
                }),
            };
        }

        Some(Ok(BranchStep {
            snapshot,
            halo_id,
            record,
        }))
    }
}

impl FusedIterator for MainBranch<'_> {}
