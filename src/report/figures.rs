use std::path::PathBuf;

use tracing::{info, warn};

use super::csv;
use super::names;
use super::plot::{self, Axes, Series};
use super::{OutputDir, ReportError};
use crate::analysis::{
    BranchComparison, BranchLengthComparison, BranchLengths, BranchSamples, BranchStatistic,
    LinkCountComparison, LinkCounts,
};
use crate::catalogue::{HaloCatalogue, MassPair, OccupancyRange};
use crate::statistics::{Histogram, StatisticsError};

fn log_count(count: u64) -> f64 {
    (count as f64 + 1.0).log10()
}

fn statistic_series(
    statistic: BranchStatistic,
    label: &str,
    values: &[f64],
    bins: usize,
) -> Result<Series, StatisticsError> {
    let hist = Histogram::new(values, bins)?;
    let points = match statistic {
        // Growth rates are unbounded; arctan maps them onto (-π/2, π/2).
        BranchStatistic::LogMassGrowth => hist
            .left_edges()
            .iter()
            .zip(hist.counts())
            .map(|(&x, &n)| (x.atan(), log_count(n)))
            .collect(),
        BranchStatistic::MassFluctuation => hist
            .left_edges()
            .iter()
            .zip(hist.counts())
            .map(|(&x, &n)| (x, log_count(n)))
            .collect(),
    };
    Ok(Series::new(label, points))
}

fn statistic_axes(statistic: BranchStatistic) -> Axes<'static> {
    match statistic {
        BranchStatistic::LogMassGrowth => Axes {
            title: "Main branch mass growth",
            x: "arctan(dlogM/dlogt)",
            y: "log10(N+1)",
        },
        BranchStatistic::MassFluctuation => Axes {
            title: "Main branch mass fluctuation",
            x: "xi_M",
            y: "log10(N+1)",
        },
    }
}

fn integer_series(label: &str, values: &[u64]) -> Result<(Histogram, Series), StatisticsError> {
    let hist = Histogram::integer(values)?;
    let points = hist
        .centres()
        .into_iter()
        .zip(hist.counts())
        .map(|(x, &n)| (x, log_count(n)))
        .collect();
    Ok((hist, Series::new(label, points)))
}

fn written(stem: &str, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    info!(figure = stem, files = paths.len(), "report written");
    paths
}

/// Histogram of one dataset's main-branch statistic.
pub fn branch_statistic_figure(
    out: &OutputDir,
    statistic: BranchStatistic,
    samples: &BranchSamples,
    label: &str,
    cutoff: u64,
    bins: usize,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::branch_statistic(statistic, label, cutoff);
    let series = statistic_series(statistic, label, &samples.values, bins)?;

    let svg = out.file(&stem, "svg");
    plot::line_chart(&svg, statistic_axes(statistic), &[series])?;
    let table = out.write_csv(&stem, |w| csv::write_samples(w, &samples.values))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Overlaid histograms of the same statistic over two datasets.
///
/// A dataset without values is left out of the figure.
pub fn branch_comparison_figure(
    out: &OutputDir,
    statistic: BranchStatistic,
    comparison: &BranchComparison,
    labels: (&str, &str),
    cutoff: u64,
    bins: usize,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::branch_comparison(statistic, cutoff);
    let mut series = Vec::with_capacity(2);
    for (label, samples) in [(labels.0, &comparison.first), (labels.1, &comparison.second)] {
        match statistic_series(statistic, label, &samples.values, bins) {
            Ok(s) => series.push(s),
            Err(StatisticsError::EmptySample) => warn!(label, "no values to compare"),
            Err(err) => return Err(err.into()),
        }
    }

    let svg = out.file(&stem, "svg");
    plot::line_chart(&svg, statistic_axes(statistic), &series)?;
    let table = out.write_csv(&stem, |w| csv::write_curves(w, &series))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Distribution of main-branch lengths.
pub fn branch_length_figure(
    out: &OutputDir,
    lengths: &BranchLengths,
    label: &str,
    cutoff: u64,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::branch_length(label, cutoff);
    let (hist, series) = integer_series(label, &lengths.lengths)?;

    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: "Main branch length",
        x: "halos on main branch",
        y: "log10(N+1)",
    };
    plot::bar_chart(&svg, axes, &[series])?;
    let table = out.write_csv(&stem, |w| csv::write_histogram(w, &hist))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Overlaid branch-length distributions of two datasets.
///
/// A dataset without branches is left out of the figure.
pub fn branch_length_comparison_figure(
    out: &OutputDir,
    comparison: &BranchLengthComparison,
    labels: (&str, &str),
    cutoff: u64,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::branch_length_comparison(cutoff);
    let mut series = Vec::with_capacity(2);
    for (label, lengths) in [(labels.0, &comparison.first), (labels.1, &comparison.second)] {
        match integer_series(label, &lengths.lengths) {
            Ok((_, s)) => series.push(s),
            Err(StatisticsError::EmptySample) => warn!(label, "no branches to compare"),
            Err(err) => return Err(err.into()),
        }
    }

    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: "Main branch length",
        x: "halos on main branch",
        y: "log10(N+1)",
    };
    plot::bar_chart(&svg, axes, &series)?;
    let table = out.write_csv(&stem, |w| csv::write_curves(w, &series))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Progenitor and descendant count histograms of one dataset.
pub fn link_count_figure(
    out: &OutputDir,
    counts: &LinkCounts,
    label: &str,
    cutoff: u64,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::link_counts(label, cutoff);
    let (_, progenitors) = integer_series("nProg", &counts.progenitors)?;
    let (_, descendants) = integer_series("nDesc", &counts.descendants)?;

    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: label,
        x: "number of links",
        y: "log10(N+1)",
    };
    plot::bar_chart(&svg, axes, &[progenitors, descendants])?;
    let table = out.write_csv(&stem, |w| csv::write_link_counts(w, counts))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Link count histograms of two datasets, plus the fraction of halos with
/// at least `n` links.
pub fn link_count_comparison_figures(
    out: &OutputDir,
    comparison: &LinkCountComparison,
    labels: (&str, &str),
    cutoff: u64,
) -> Result<Vec<PathBuf>, ReportError> {
    let mut bars = Vec::new();
    let mut tails = Vec::new();
    for (label, counts) in [(labels.0, &comparison.first), (labels.1, &comparison.second)] {
        if counts.is_empty() {
            warn!(label, "no halos above cutoff");
            continue;
        }
        for (side, values) in [("nProg", &counts.progenitors), ("nDesc", &counts.descendants)] {
            let name = format!("{label} {side}");
            let (hist, series) = integer_series(&name, values)?;
            let tail = hist.centres().into_iter().zip(hist.cumulative_tail()).collect();
            bars.push(series);
            tails.push(Series::new(name, tail));
        }
    }

    let mut paths = Vec::with_capacity(4);

    let stem = names::link_count_comparison(cutoff);
    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: "Progenitor and descendant counts",
        x: "number of links",
        y: "log10(N+1)",
    };
    plot::bar_chart(&svg, axes, &bars)?;
    paths.push(svg);
    paths.push(out.write_csv(&stem, |w| csv::write_curves(w, &bars))?);

    let stem = names::link_count_cumulative(cutoff);
    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: "Cumulative link counts",
        x: "number of links",
        y: "fraction with at least n",
    };
    plot::line_chart(&svg, axes, &tails)?;
    paths.push(svg);
    paths.push(out.write_csv(&stem, |w| csv::write_curves(w, &tails))?);

    Ok(written("link count comparison", paths))
}

/// Histogram of sub-halo occupancy for each catalogue.
pub fn occupancy_figure(
    out: &OutputDir,
    catalogues: &[(&str, &HaloCatalogue)],
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::OCCUPANCY;
    let mut series = Vec::with_capacity(catalogues.len());
    for &(label, catalogue) in catalogues {
        match integer_series(label, &catalogue.occupancies()) {
            Ok((_, s)) => series.push(s),
            Err(StatisticsError::EmptySample) => warn!(label, "catalogue has no hosts"),
            Err(err) => return Err(err.into()),
        }
    }

    let svg = out.file(stem, "svg");
    let axes = Axes {
        title: "Sub-halo occupancy",
        x: "sub-halos per host",
        y: "log10(N+1)",
    };
    plot::bar_chart(&svg, axes, &series)?;
    let table = out.write_csv(stem, |w| csv::write_curves(w, &series))?;
    Ok(written(stem, vec![svg, table]))
}

fn mass_series(label: &str, pairs: &[MassPair], log: bool) -> Series {
    let points = pairs.iter().map(|p| (p.host as f64, p.subhalos as f64));
    if log {
        Series::new(label, points.map(|(x, y)| (x.log10(), y.log10())).collect())
    } else {
        Series::new(label, points.collect())
    }
}

/// Host mass against summed and against largest sub-halo mass, log-log.
///
/// Hosts without sub-halos have no finite logarithm and only appear in the
/// tables.
pub fn subhalo_mass_figures(
    out: &OutputDir,
    catalogues: &[(&str, &HaloCatalogue)],
) -> Result<Vec<PathBuf>, ReportError> {
    let mut paths = Vec::with_capacity(4);
    let panels: [(&str, &str, fn(&HaloCatalogue) -> Vec<MassPair>); 2] = [
        (
            names::SUMMED_MASS,
            "log10 summed sub-halo nPart",
            HaloCatalogue::summed_subhalo_masses,
        ),
        (
            names::LARGEST_MASS,
            "log10 largest sub-halo nPart",
            HaloCatalogue::largest_subhalo_masses,
        ),
    ];

    for (stem, y, pairs_of) in panels {
        let pairs: Vec<_> = catalogues
            .iter()
            .map(|&(label, catalogue)| (label, pairs_of(catalogue)))
            .collect();
        let plotted: Vec<_> = pairs.iter().map(|(l, p)| mass_series(l, p, true)).collect();
        let raw: Vec<_> = pairs.iter().map(|(l, p)| mass_series(l, p, false)).collect();

        let svg = out.file(stem, "svg");
        let axes = Axes {
            title: stem,
            x: "log10 host nPart",
            y,
        };
        plot::scatter_chart(&svg, axes, &plotted)?;
        paths.push(svg);
        paths.push(out.write_csv(stem, |w| csv::write_curves(w, &raw))?);
    }
    Ok(written("sub-halo mass", paths))
}

/// Which sub-halo ratio a figure shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioKind {
    /// Distance from the host centre over the host radius.
    Position,
    /// Speed offset over the host velocity dispersion.
    Speed,
}

impl RatioKind {
    fn ratios(self, catalogue: &HaloCatalogue, range: OccupancyRange) -> Vec<f64> {
        match self {
            RatioKind::Position => catalogue.subhalo_position_ratios(range),
            RatioKind::Speed => catalogue.subhalo_speed_ratios(range),
        }
    }

    fn stem(self, range: OccupancyRange) -> String {
        match self {
            RatioKind::Position => names::subhalo_position(range),
            RatioKind::Speed => names::subhalo_velocity(range),
        }
    }

    fn comparison_stem(self) -> &'static str {
        match self {
            RatioKind::Position => names::SUBHALO_POSITION_COMPARISON,
            RatioKind::Speed => names::SUBHALO_VELOCITY_COMPARISON,
        }
    }

    fn axes(self) -> Axes<'static> {
        match self {
            RatioKind::Position => Axes {
                title: "Sub-halo position",
                x: "|r_sub - r_host| / R_host",
                y: "probability density",
            },
            RatioKind::Speed => Axes {
                title: "Sub-halo velocity",
                x: "| |v_sub| - |v_host| | / sigma_v",
                y: "probability density",
            },
        }
    }
}

fn density_series(label: &str, values: &[f64], bins: usize) -> Result<Series, StatisticsError> {
    let hist = Histogram::new(values, bins)?;
    let points = hist.centres().into_iter().zip(hist.density()).collect();
    Ok(Series::new(label, points))
}

/// Density of one sub-halo ratio for hosts with occupancy in `range`.
pub fn subhalo_ratio_figure(
    out: &OutputDir,
    kind: RatioKind,
    catalogue: &HaloCatalogue,
    range: OccupancyRange,
    label: &str,
    bins: usize,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = kind.stem(range);
    let ratios = kind.ratios(catalogue, range);
    let series = density_series(label, &ratios, bins)?;

    let svg = out.file(&stem, "svg");
    plot::line_chart(&svg, kind.axes(), &[series])?;
    let table = out.write_csv(&stem, |w| csv::write_samples(w, &ratios))?;
    Ok(written(&stem, vec![svg, table]))
}

/// Overlaid ratio densities, one per `(label, catalogue, range)` entry.
pub fn subhalo_ratio_comparison_figure(
    out: &OutputDir,
    kind: RatioKind,
    entries: &[(&str, &HaloCatalogue, OccupancyRange)],
    bins: usize,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = kind.comparison_stem();
    let mut series = Vec::with_capacity(entries.len());
    for &(label, catalogue, range) in entries {
        let name = format!("{label} Occ={range}");
        match density_series(&name, &kind.ratios(catalogue, range), bins) {
            Ok(s) => series.push(s),
            Err(StatisticsError::EmptySample) => warn!(series = %name, "no sub-halos selected"),
            Err(err) => return Err(err.into()),
        }
    }

    let svg = out.file(stem, "svg");
    plot::line_chart(&svg, kind.axes(), &series)?;
    let table = out.write_csv(stem, |w| csv::write_curves(w, &series))?;
    Ok(written(stem, vec![svg, table]))
}

/// Position ratio against speed ratio for every selected sub-halo, one
/// scatter series per catalogue.
pub fn phase_figure(
    out: &OutputDir,
    catalogues: &[(&str, &HaloCatalogue)],
    range: OccupancyRange,
) -> Result<Vec<PathBuf>, ReportError> {
    let stem = names::subhalo_phase(range);
    let sets: Vec<_> = catalogues
        .iter()
        .map(|&(label, catalogue)| (label, catalogue.subhalo_phase_points(range)))
        .collect();
    let series: Vec<_> = sets
        .iter()
        .map(|(label, points)| {
            Series::new(*label, points.iter().map(|p| (p.position, p.speed)).collect())
        })
        .collect();

    let svg = out.file(&stem, "svg");
    let axes = Axes {
        title: "Sub-halo phase space",
        x: "|r_sub - r_host| / R_host",
        y: "| |v_sub| - |v_host| | / sigma_v",
    };
    plot::scatter_chart(&svg, axes, &series)?;
    let table = out.write_csv(&stem, |w| csv::write_phase_points(w, &sets))?;
    Ok(written(&stem, vec![svg, table]))
}
