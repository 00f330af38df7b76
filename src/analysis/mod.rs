//! Aggregation over whole datasets
//!
//! Walks every qualifying main branch (or every halo, for link counts),
//! collects statistic samples and compares datasets. Lineage failures are
//! isolated: they are logged, counted and excluded, and the batch goes on.

mod branch_stats;
mod link_counts;

pub use branch_stats::{
    branch_lengths, collect_branch_statistic, compare_branch_lengths, compare_branch_statistic,
    main_branch_roots, BranchComparison, BranchLengthComparison, BranchLengths, BranchSamples,
    BranchStatistic, LineageFailure,
};
pub use link_counts::{compare_link_counts, link_counts, LinkCountComparison, LinkCounts};
