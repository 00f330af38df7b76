//! Figures and tables
//!
//! Every analysis is written twice into the output directory: an SVG figure
//! for inspection and a CSV table holding the plotted numbers. File stems
//! follow the naming scheme of the plotting scripts the catalogues were
//! first analysed with, so figures from both can sit side by side.

pub mod csv;
mod figures;
pub mod plot;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::BranchStatistic;
use crate::catalogue::OccupancyRange;
use crate::statistics::StatisticsError;

pub use figures::{
    branch_comparison_figure, branch_length_comparison_figure, branch_length_figure,
    branch_statistic_figure,
    link_count_comparison_figures, link_count_figure, occupancy_figure, phase_figure,
    subhalo_mass_figures, subhalo_ratio_comparison_figure, subhalo_ratio_figure, RatioKind,
};

/// Errors raised while writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing a table or creating the output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The plotting backend failed.
    #[error("render error: {0}")]
    Render(String),

    /// Binning the plotted values failed.
    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}

/// Directory receiving figures and tables.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Use `root`, creating it and its parents if missing.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<stem>.<extension>` inside the directory.
    pub fn file(&self, stem: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{stem}.{extension}"))
    }

    fn write_csv<F>(&self, stem: &str, write: F) -> Result<PathBuf, ReportError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
    {
        let path = self.file(stem, "csv");
        let mut writer = BufWriter::new(File::create(&path)?);
        write(&mut writer)?;
        Ok(path)
    }
}

/// File stems.
pub mod names {
    use super::*;

    /// `logMgrowth_<label>_<cutoff>` / `massFluc_<label>_<cutoff>`.
    pub fn branch_statistic(statistic: BranchStatistic, label: &str, cutoff: u64) -> String {
        format!("{}_{label}_{cutoff}", statistic.name())
    }

    /// `logMgrowthComp_<cutoff>` / `massFlucComp_<cutoff>`.
    pub fn branch_comparison(statistic: BranchStatistic, cutoff: u64) -> String {
        format!("{}Comp_{cutoff}", statistic.name())
    }

    /// `branchLength_<label>_<cutoff>`.
    pub fn branch_length(label: &str, cutoff: u64) -> String {
        format!("branchLength_{label}_{cutoff}")
    }

    /// `branchLengthComp_<cutoff>`.
    pub fn branch_length_comparison(cutoff: u64) -> String {
        format!("branchLengthComp_{cutoff}")
    }

    /// `ProgDescNumberHist_<label>_<cutoff>`.
    pub fn link_counts(label: &str, cutoff: u64) -> String {
        format!("ProgDescNumberHist_{label}_{cutoff}")
    }

    /// `ProgDescHistComp_<cutoff>`.
    pub fn link_count_comparison(cutoff: u64) -> String {
        format!("ProgDescHistComp_{cutoff}")
    }

    /// `ProgDescHist_<cutoff>`, the cumulative comparison.
    pub fn link_count_cumulative(cutoff: u64) -> String {
        format!("ProgDescHist_{cutoff}")
    }

    /// `NumberOccupancy`.
    pub const OCCUPANCY: &str = "NumberOccupancy";
    /// `SumMassComp`.
    pub const SUMMED_MASS: &str = "SumMassComp";
    /// `MaxMassComp`.
    pub const LARGEST_MASS: &str = "MaxMassComp";

    /// `SubHaloPos_Occ=<l>-<h>`.
    pub fn subhalo_position(range: OccupancyRange) -> String {
        format!("SubHaloPos_Occ={range}")
    }

    /// `SubHaloPosComp`.
    pub const SUBHALO_POSITION_COMPARISON: &str = "SubHaloPosComp";

    /// `SubHaloVel_Occ=<l>-<h>`.
    pub fn subhalo_velocity(range: OccupancyRange) -> String {
        format!("SubHaloVel_Occ={range}")
    }

    /// `SubHaloVelComp`.
    pub const SUBHALO_VELOCITY_COMPARISON: &str = "SubHaloVelComp";

    /// `SubHaloPosVel_Occ=<l>-<h>`.
    pub fn subhalo_phase(range: OccupancyRange) -> String {
        format!("SubHaloPosVel_Occ={range}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_follow_plot_naming() {
        assert_eq!(
            names::branch_statistic(BranchStatistic::LogMassGrowth, "ll=0.1", 10),
            "logMgrowth_ll=0.1_10"
        );
        assert_eq!(
            names::branch_comparison(BranchStatistic::MassFluctuation, 20),
            "massFlucComp_20"
        );
        assert_eq!(names::link_counts("ll=0.2", 10), "ProgDescNumberHist_ll=0.2_10");
        assert_eq!(names::link_count_cumulative(10), "ProgDescHist_10");
        assert_eq!(names::branch_length_comparison(10), "branchLengthComp_10");
        let range = OccupancyRange::new(2, 5).unwrap();
        assert_eq!(names::subhalo_position(range), "SubHaloPos_Occ=2-5");
        assert_eq!(names::subhalo_phase(range), "SubHaloPosVel_Occ=2-5");
    }

    #[test]
    fn output_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::create(tmp.path().join("Plots/nested")).unwrap();
        assert!(out.root().is_dir());
        assert_eq!(
            out.file("NumberOccupancy", "svg"),
            tmp.path().join("Plots/nested/NumberOccupancy.svg")
        );
    }
}
