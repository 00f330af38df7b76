//! Mass-history statistics evaluated at a single halo of a main branch.
//!
//! All functions return `None` when the statistic is undefined: a required
//! neighbour is missing, a mass falls below the cutoff, or the arithmetic
//! would divide by zero.

use std::f64::consts::PI;

use crate::mergertree::HaloRecord;
use crate::snapshot::{SnapshotId, SnapshotIndex};

/// Symmetrised relative growth rate between two consecutive halos.
///
/// `(t1 + t0)(m1 - m0) / ((t1 - t0)(m1 + m0))`, a finite-difference estimate
/// of `d ln M / d ln t`. Returns `None` for a zero denominator or a
/// non-finite result.
pub fn growth_rate(m0: f64, m1: f64, t0: f64, t1: f64) -> Option<f64> {
    let denominator = (t1 - t0) * (m1 + m0);
    if denominator == 0.0 {
        return None;
    }
    let rate = (t1 + t0) * (m1 - m0) / denominator;
    rate.is_finite().then_some(rate)
}

/// Logarithmic mass growth from a halo to its main descendant.
///
/// Undefined when the halo has no descendant, sits at the latest snapshot,
/// or either mass is below `cutoff`.
pub fn log_mass_growth(
    record: &HaloRecord,
    snapshot: SnapshotId,
    index: &SnapshotIndex,
    cutoff: u64,
) -> Option<f64> {
    let descendant = record.main_descendant()?;
    if descendant.particles < cutoff || record.particles < cutoff {
        return None;
    }

    let next = index.next(snapshot)?;
    growth_rate(
        record.particles as f64,
        descendant.particles as f64,
        index.time_of(snapshot),
        index.time_of(next),
    )
}

/// Mass fluctuation across a progenitor, the halo and its descendant.
///
/// `(atan(α_desc) - atan(α_prog)) / π` where each `α` is the
/// [`growth_rate`] of one step; bounded in `(-1, 1)`. Undefined when either
/// neighbour is missing or any of the three masses is below `cutoff`.
pub fn mass_fluctuation(
    record: &HaloRecord,
    snapshot: SnapshotId,
    index: &SnapshotIndex,
    cutoff: u64,
) -> Option<f64> {
    let progenitor = record.main_progenitor()?;
    let descendant = record.main_descendant()?;
    if descendant.particles < cutoff || progenitor.particles < cutoff || record.particles < cutoff
    {
        return None;
    }

    let previous = index.previous(snapshot)?;
    let next = index.next(snapshot)?;

    let current_mass = record.particles as f64;
    let current_time = index.time_of(snapshot);

    let into_descendant = growth_rate(
        current_mass,
        descendant.particles as f64,
        current_time,
        index.time_of(next),
    )?;
    let from_progenitor = growth_rate(
        progenitor.particles as f64,
        current_mass,
        index.time_of(previous),
        current_time,
    )?;

    Some((into_descendant.atan() - from_progenitor.atan()) / PI)
}
