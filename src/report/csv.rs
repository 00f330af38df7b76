//! CSV tables written next to every figure
//!
//! Floats use Rust's shortest round-trip formatting, so a table re-read
//! with any CSV reader gives back the plotted values exactly.

use std::io::Write;

use super::plot::Series;
use super::ReportError;
use crate::analysis::LinkCounts;
use crate::catalogue::{MassPair, PhasePoint};
use crate::statistics::Histogram;

/// Write one statistic value per line under a `value` header.
pub fn write_samples<W: Write>(writer: &mut W, values: &[f64]) -> Result<(), ReportError> {
    writeln!(writer, "value")?;
    for value in values {
        writeln!(writer, "{value}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write histogram bins as `bin_left,bin_right,count`.
pub fn write_histogram<W: Write>(writer: &mut W, histogram: &Histogram) -> Result<(), ReportError> {
    writeln!(writer, "bin_left,bin_right,count")?;
    for (edges, count) in histogram.edges().windows(2).zip(histogram.counts()) {
        writeln!(writer, "{},{},{}", edges[0], edges[1], count)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write per-halo progenitor and descendant counts.
pub fn write_link_counts<W: Write>(writer: &mut W, counts: &LinkCounts) -> Result<(), ReportError> {
    writeln!(writer, "n_prog,n_desc")?;
    for (n_prog, n_desc) in counts.progenitors.iter().zip(&counts.descendants) {
        writeln!(writer, "{n_prog},{n_desc}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write host/sub-halo mass pairs.
pub fn write_mass_pairs<W: Write>(writer: &mut W, pairs: &[MassPair]) -> Result<(), ReportError> {
    writeln!(writer, "host_nPart,subhalo_nPart")?;
    for pair in pairs {
        writeln!(writer, "{},{}", pair.host, pair.subhalos)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write paired sub-halo position and speed ratios, one labelled set per
/// catalogue.
pub fn write_phase_points<W: Write>(
    writer: &mut W,
    sets: &[(&str, Vec<PhasePoint>)],
) -> Result<(), ReportError> {
    writeln!(writer, "series,position_ratio,speed_ratio")?;
    for (label, points) in sets {
        for point in points {
            writeln!(writer, "{label},{},{}", point.position, point.speed)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write plotted curves in long form as `series,x,y`.
pub fn write_curves<W: Write>(writer: &mut W, series: &[Series]) -> Result<(), ReportError> {
    writeln!(writer, "series,x,y")?;
    for s in series {
        for (x, y) in &s.points {
            writeln!(writer, "{},{x},{y}", s.label)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Render statistic values into a CSV string (useful for tests and snapshots).
pub fn render_samples(values: &[f64]) -> Result<String, ReportError> {
    render(|buffer| write_samples(buffer, values))
}

/// Render a histogram into a CSV string.
pub fn render_histogram(histogram: &Histogram) -> Result<String, ReportError> {
    render(|buffer| write_histogram(buffer, histogram))
}

/// Render plotted curves into a CSV string.
pub fn render_curves(series: &[Series]) -> Result<String, ReportError> {
    render(|buffer| write_curves(buffer, series))
}

fn render<F>(write: F) -> Result<String, ReportError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), ReportError>,
{
    let mut buffer = Vec::new();
    write(&mut buffer)?;
    String::from_utf8(buffer).map_err(|_| ReportError::Render("CSV is not valid UTF-8".into()))
}
