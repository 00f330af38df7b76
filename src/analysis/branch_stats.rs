use rayon::prelude::*;
use tracing::{info, warn};

use crate::branch::{MainBranch, TraversalError};
use crate::mergertree::{HaloId, HaloRecord, MergerTree};
use crate::snapshot::{SnapshotId, SnapshotIndex};
use crate::statistics::{growth, ks_two_sample, KsResult, StatisticsError};

/// Statistic evaluated at each qualifying halo of a main branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatistic {
    /// Growth from each halo to its descendant.
    LogMassGrowth,
    /// Change of growth rate across progenitor, halo and descendant.
    MassFluctuation,
}

impl BranchStatistic {
    /// Short name used in logs and file names.
    pub fn name(self) -> &'static str {
        match self {
            BranchStatistic::LogMassGrowth => "logMgrowth",
            BranchStatistic::MassFluctuation => "massFluc",
        }
    }

    /// Evaluate at one halo; `None` when undefined there.
    pub fn evaluate(
        self,
        record: &HaloRecord,
        snapshot: SnapshotId,
        index: &SnapshotIndex,
        cutoff: u64,
    ) -> Option<f64> {
        match self {
            BranchStatistic::LogMassGrowth => {
                growth::log_mass_growth(record, snapshot, index, cutoff)
            }
            BranchStatistic::MassFluctuation => {
                growth::mass_fluctuation(record, snapshot, index, cutoff)
            }
        }
    }
}

/// A root whose main branch could not be walked to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageFailure {
    /// Root halo at the latest snapshot.
    pub root_id: HaloId,
    /// Why the walk stopped.
    pub error: TraversalError,
}

/// Samples gathered over every qualifying main branch of one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchSamples {
    /// Defined statistic values, in root order then branch order.
    pub values: Vec<f64>,
    /// Evaluations that returned undefined and were discarded.
    pub undefined: usize,
    /// Number of roots that were walked.
    pub roots: usize,
    /// Lineages excluded because their walk failed.
    pub failures: Vec<LineageFailure>,
}

/// Branch samples of two datasets with a distributional comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchComparison {
    /// Samples of the primary dataset.
    pub first: BranchSamples,
    /// Samples of the comparison dataset.
    pub second: BranchSamples,
    /// Two-sample KS test; an error when either dataset produced no values.
    pub ks: Result<KsResult, StatisticsError>,
}

impl BranchComparison {
    /// Compare two already collected sample sets.
    pub fn new(first: BranchSamples, second: BranchSamples) -> Self {
        let ks = ks_two_sample(&first.values, &second.values);
        Self { first, second, ks }
    }
}

/// Halos at the latest snapshot whose mass reaches `cutoff`.
pub fn main_branch_roots(tree: &MergerTree, index: &SnapshotIndex, cutoff: u64) -> Vec<HaloId> {
    tree.halos_at(index.latest())
        .filter(|(_, record)| record.particles >= cutoff)
        .map(|(id, _)| id)
        .collect()
}

struct Lineage {
    values: Vec<f64>,
    undefined: usize,
}

fn walk_lineage(
    tree: &MergerTree,
    index: &SnapshotIndex,
    statistic: BranchStatistic,
    cutoff: u64,
    root_id: HaloId,
) -> Result<Lineage, TraversalError> {
    let mut lineage = Lineage {
        values: Vec::new(),
        undefined: 0,
    };

    for step in MainBranch::walk(tree, index, index.latest(), root_id) {
        let step = step?;
        let record = step.record;
        // The latest snapshot has no descendants to grow into.
        if index.next(step.snapshot).is_none() || record.n_desc() == 0 || record.particles < cutoff
        {
            continue;
        }
        match statistic.evaluate(record, step.snapshot, index, cutoff) {
            Some(value) => lineage.values.push(value),
            None => lineage.undefined += 1,
        }
    }

    Ok(lineage)
}

/// Evaluate `statistic` along the main branch of every root.
///
/// Roots are walked in parallel. A failed walk drops that lineage's samples,
/// is logged with its root id and is reported in
/// [`BranchSamples::failures`]; it never aborts the batch.
pub fn collect_branch_statistic(
    tree: &MergerTree,
    index: &SnapshotIndex,
    statistic: BranchStatistic,
    cutoff: u64,
) -> BranchSamples {
    let roots = main_branch_roots(tree, index, cutoff);
    info!(
        statistic = statistic.name(),
        roots = roots.len(),
        cutoff,
        "walking main branches"
    );

    let outcomes: Vec<_> = roots
        .par_iter()
        .map(|&root_id| (root_id, walk_lineage(tree, index, statistic, cutoff, root_id)))
        .collect();

    let mut samples = BranchSamples {
        roots: roots.len(),
        ..BranchSamples::default()
    };
    for (root_id, outcome) in outcomes {
        match outcome {
            Ok(lineage) => {
                samples.values.extend(lineage.values);
                samples.undefined += lineage.undefined;
            }
            Err(error) => {
                warn!(root_id, %error, "skipping lineage");
                samples.failures.push(LineageFailure { root_id, error });
            }
        }
    }

    info!(
        statistic = statistic.name(),
        values = samples.values.len(),
        undefined = samples.undefined,
        failed = samples.failures.len(),
        "main branch statistic collected"
    );
    samples
}

/// Run [`collect_branch_statistic`] on two datasets and compare them.
pub fn compare_branch_statistic(
    first: (&MergerTree, &SnapshotIndex),
    second: (&MergerTree, &SnapshotIndex),
    statistic: BranchStatistic,
    cutoff: u64,
) -> BranchComparison {
    BranchComparison::new(
        collect_branch_statistic(first.0, first.1, statistic, cutoff),
        collect_branch_statistic(second.0, second.1, statistic, cutoff),
    )
}

/// Main-branch lengths of every root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchLengths {
    /// Number of halos on each successfully walked branch, in root order.
    pub lengths: Vec<u64>,
    /// Lineages excluded because their walk failed.
    pub failures: Vec<LineageFailure>,
}

/// Count the halos on the main branch of every root with mass ≥ `cutoff`.
pub fn branch_lengths(tree: &MergerTree, index: &SnapshotIndex, cutoff: u64) -> BranchLengths {
    let roots = main_branch_roots(tree, index, cutoff);
    info!(roots = roots.len(), cutoff, "measuring main branch lengths");

    let outcomes: Vec<_> = roots
        .par_iter()
        .map(|&root_id| {
            let length = MainBranch::walk(tree, index, index.latest(), root_id)
                .try_fold(0u64, |n, step| step.map(|_| n + 1));
            (root_id, length)
        })
        .collect();

    let mut result = BranchLengths::default();
    for (root_id, outcome) in outcomes {
        match outcome {
            Ok(length) => result.lengths.push(length),
            Err(error) => {
                warn!(root_id, %error, "skipping lineage");
                result.failures.push(LineageFailure { root_id, error });
            }
        }
    }
    result
}

/// Branch lengths of two datasets with a KS test on the lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchLengthComparison {
    /// Lengths in the primary dataset.
    pub first: BranchLengths,
    /// Lengths in the comparison dataset.
    pub second: BranchLengths,
    /// Two-sample KS test; an error when either dataset has no branches.
    pub ks: Result<KsResult, StatisticsError>,
}

/// Run [`branch_lengths`] on two datasets and compare them.
pub fn compare_branch_lengths(
    first: (&MergerTree, &SnapshotIndex),
    second: (&MergerTree, &SnapshotIndex),
    cutoff: u64,
) -> BranchLengthComparison {
    let first = branch_lengths(first.0, first.1, cutoff);
    let second = branch_lengths(second.0, second.1, cutoff);
    let as_f64 = |v: &[u64]| v.iter().map(|&n| n as f64).collect::<Vec<_>>();
    let ks = ks_two_sample(&as_f64(&first.lengths), &as_f64(&second.lengths));
    BranchLengthComparison { first, second, ks }
}
