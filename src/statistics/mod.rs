//! Statistics over halos and samples
//!
//! * [`growth`]: per-halo derived statistics along a main branch
//! * [`Histogram`]: equal-width and integer binning
//! * [`ks_two_sample`]: distributional comparison of two samples

pub mod growth;
mod histogram;
mod ks;

pub use growth::{growth_rate, log_mass_growth, mass_fluctuation};
pub use histogram::Histogram;
pub use ks::{ks_two_sample, KsResult};

use thiserror::Error;

/// Errors raised by sample statistics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// The sample holds no values.
    #[error("sample is empty")]
    EmptySample,

    /// The sample holds NaN or infinite values.
    #[error("sample contains non-finite values")]
    NonFinite,

    /// A histogram was requested with zero bins.
    #[error("histogram needs at least one bin")]
    ZeroBins,
}
