use tracing::{debug, info};

use crate::mergertree::MergerTree;
use crate::snapshot::SnapshotIndex;
use crate::statistics::{ks_two_sample, KsResult, StatisticsError};

/// Progenitor and descendant counts of every halo above the cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCounts {
    /// `nProg` per halo, snapshots in ordinal order, halos in id order.
    pub progenitors: Vec<u64>,
    /// `nDesc` per halo, parallel to `progenitors`.
    pub descendants: Vec<u64>,
}

impl LinkCounts {
    /// Number of halos counted.
    pub fn len(&self) -> usize {
        self.progenitors.len()
    }

    /// Whether no halo passed the cutoff.
    pub fn is_empty(&self) -> bool {
        self.progenitors.is_empty()
    }
}

/// Link counts of two datasets with KS tests on each count.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCountComparison {
    /// Counts of the primary dataset.
    pub first: LinkCounts,
    /// Counts of the comparison dataset.
    pub second: LinkCounts,
    /// KS test on progenitor counts; an error if either side is empty.
    pub progenitor_ks: Result<KsResult, StatisticsError>,
    /// KS test on descendant counts; an error if either side is empty.
    pub descendant_ks: Result<KsResult, StatisticsError>,
}

/// Gather `nProg`/`nDesc` for every halo with mass ≥ `cutoff`.
pub fn link_counts(tree: &MergerTree, index: &SnapshotIndex, cutoff: u64) -> LinkCounts {
    let mut counts = LinkCounts::default();
    for snapshot in index.iter() {
        debug!(%snapshot, halos = tree.count_at(snapshot), "counting links");
        for (_, record) in tree.halos_at(snapshot) {
            if record.particles < cutoff {
                continue;
            }
            counts.progenitors.push(record.n_prog() as u64);
            counts.descendants.push(record.n_desc() as u64);
        }
    }
    info!(halos = counts.len(), cutoff, "link counts collected");
    counts
}

/// Gather link counts of two datasets and compare their distributions.
pub fn compare_link_counts(
    first: (&MergerTree, &SnapshotIndex),
    second: (&MergerTree, &SnapshotIndex),
    cutoff: u64,
) -> LinkCountComparison {
    let first = link_counts(first.0, first.1, cutoff);
    let second = link_counts(second.0, second.1, cutoff);

    let as_f64 = |v: &[u64]| v.iter().map(|&n| n as f64).collect::<Vec<_>>();
    let progenitor_ks = ks_two_sample(&as_f64(&first.progenitors), &as_f64(&second.progenitors));
    let descendant_ks = ks_two_sample(&as_f64(&first.descendants), &as_f64(&second.descendants));

    LinkCountComparison {
        first,
        second,
        progenitor_ks,
        descendant_ks,
    }
}
