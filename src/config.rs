//! Analysis configuration shared by the library entry points and the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Default halo mass cutoff in particles.
pub const DEFAULT_CUTOFF: u64 = 10;

/// Errors raised by [`AnalysisConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A histogram was configured with zero bins.
    #[error("{0} must be at least 1")]
    ZeroBins(&'static str),

    /// A dataset label is empty.
    #[error("dataset labels must not be empty")]
    EmptyLabel,
}

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Halo mass cutoff in particles; lighter halos contribute no samples.
    pub cutoff: u64,

    /// Histogram bins for logarithmic mass growth.
    pub growth_bins: usize,

    /// Histogram bins for mass fluctuation.
    pub fluctuation_bins: usize,

    /// Histogram bins for sub-halo position and speed ratios.
    pub ratio_bins: usize,

    /// Directory receiving plots and CSV files.
    pub output_dir: PathBuf,

    /// Label of the primary dataset (used in file names and legends).
    pub primary_label: String,

    /// Label of the comparison dataset.
    pub comparison_label: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            growth_bins: 1000,
            fluctuation_bins: 50,
            ratio_bins: 50,
            output_dir: PathBuf::from("Plots"),
            primary_label: "ll=0.1".to_string(),
            comparison_label: "ll=0.2".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Override the mass cutoff.
    pub fn with_cutoff(mut self, cutoff: u64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Override the output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Override both dataset labels.
    pub fn with_labels(mut self, primary: impl Into<String>, comparison: impl Into<String>) -> Self {
        self.primary_label = primary.into();
        self.comparison_label = comparison.into();
        self
    }

    /// Check that the configuration can drive an analysis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, bins) in [
            ("growth_bins", self.growth_bins),
            ("fluctuation_bins", self.fluctuation_bins),
            ("ratio_bins", self.ratio_bins),
        ] {
            if bins == 0 {
                return Err(ConfigError::ZeroBins(name));
            }
        }
        if self.primary_label.trim().is_empty() || self.comparison_label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        Ok(())
    }
}
