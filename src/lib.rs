//! # Main-branch statistics for halo merger trees
//!
//! Halos found in a sequence of simulation snapshots are linked to their
//! progenitors (earlier snapshot) and descendants (later snapshot). This
//! crate walks the main branch of every massive halo at the final snapshot
//! and measures how smoothly it grows.
//!
//! ## Pipeline
//!
//! 1. **Load**: snapshot times and the merger tree are read from JSON
//!    ([`io`]) into a [`SnapshotIndex`] and a [`MergerTree`]
//! 2. **Walk**: [`MainBranch`] follows the most massive progenitor back
//!    to the first snapshot
//! 3. **Measure**: logarithmic growth rate and mass fluctuation are
//!    evaluated at each halo ([`statistics::growth`])
//! 4. **Aggregate**: samples of all branches are collected and compared
//!    between datasets ([`analysis`])
//! 5. **Report**: histograms are drawn to SVG and tabulated to CSV
//!    ([`report`])
//!
//! ## Usage Example
//!
//! ```ignore
//! use halotrace::{analysis, BranchStatistic, Dataset, DEFAULT_CUTOFF};
//!
//! let data = Dataset::load("tree_ll=0.1.json", "snapshots.json", "ll=0.1")?;
//! let samples = data.branch_statistic(BranchStatistic::LogMassGrowth, DEFAULT_CUTOFF);
//! println!("{} growth rates", samples.values.len());
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod analysis;   // Aggregation over every main branch
pub mod branch;     // Main-branch walker
pub mod catalogue;  // Host and sub-halo catalogue analyses
pub mod config;     // Analysis parameters
pub mod io;         // JSON input loading
pub mod mergertree; // Halo record store
pub mod report;     // SVG figures and CSV tables
pub mod snapshot;   // Snapshot identifiers and times
pub mod statistics; // Growth statistics, histograms, KS test

pub use analysis::{BranchSamples, BranchStatistic, LinkCounts};
pub use branch::{BranchStep, MainBranch, TraversalError};
pub use catalogue::{HaloCatalogue, OccupancyRange, OccupancyRangeError};
pub use config::{AnalysisConfig, ConfigError, DEFAULT_CUTOFF};
pub use io::LoadError;
pub use mergertree::{HaloId, HaloRecord, Link, MergerTree, TreeError};
pub use report::ReportError;
pub use snapshot::{SnapshotError, SnapshotId, SnapshotIndex, SNAPSHOT_COUNT};
pub use statistics::{Histogram, KsResult, StatisticsError};

use std::path::Path;

use thiserror::Error;

/// Any error raised by the library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Snapshot identifier or time sequence problem.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Merger tree lookup or consistency problem.
    #[error("merger tree error: {0}")]
    Tree(#[from] TreeError),

    /// Main-branch walk failed.
    #[error("traversal error: {0}")]
    Traversal(#[from] TraversalError),

    /// Statistic or histogram problem.
    #[error("statistics error: {0}")]
    Statistics(#[from] StatisticsError),

    /// Input could not be loaded.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Output could not be written.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// Invalid analysis parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid occupancy selection.
    #[error("occupancy range error: {0}")]
    Occupancy(#[from] OccupancyRangeError),
}

/// A merger tree together with its snapshot times and a display label.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Label used in figure names and legends, e.g. `ll=0.1`.
    pub label: String,
    /// Snapshot times.
    pub index: SnapshotIndex,
    /// Halo records.
    pub tree: MergerTree,
}

impl Dataset {
    /// Assemble a dataset, checking that the tree fits the index.
    pub fn new(
        label: impl Into<String>,
        index: SnapshotIndex,
        tree: MergerTree,
    ) -> Result<Self, AnalysisError> {
        tree.check_range(&index)?;
        Ok(Self {
            label: label.into(),
            index,
            tree,
        })
    }

    /// Load a tree and its snapshot metadata from JSON files.
    pub fn load(
        tree_path: impl AsRef<Path>,
        times_path: impl AsRef<Path>,
        label: impl Into<String>,
    ) -> Result<Self, AnalysisError> {
        let index = io::load_snapshot_index(times_path)?;
        let tree = io::load_dataset(tree_path, &index)?;
        Ok(Self {
            label: label.into(),
            index,
            tree,
        })
    }

    /// Borrow the tree and index as the pair the analysis functions take.
    pub fn as_pair(&self) -> (&MergerTree, &SnapshotIndex) {
        (&self.tree, &self.index)
    }

    /// Collect `statistic` along every main branch.
    pub fn branch_statistic(&self, statistic: BranchStatistic, cutoff: u64) -> BranchSamples {
        analysis::collect_branch_statistic(&self.tree, &self.index, statistic, cutoff)
    }

    /// Progenitor and descendant counts of every halo above `cutoff`.
    pub fn link_counts(&self, cutoff: u64) -> LinkCounts {
        analysis::link_counts(&self.tree, &self.index, cutoff)
    }
}
