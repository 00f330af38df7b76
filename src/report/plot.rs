//! SVG figures drawn with plotters.

use std::ops::Range;
use std::path::Path;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::ReportError;

const SIZE: (u32, u32) = (800, 600);

/// Colours assigned to series in order.
pub const PALETTE: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

/// Title and axis descriptions of a figure.
#[derive(Debug, Clone, Copy)]
pub struct Axes<'a> {
    /// Figure caption.
    pub title: &'a str,
    /// X axis description.
    pub x: &'a str,
    /// Y axis description.
    pub y: &'a str,
}

/// A labelled set of points.
#[derive(Debug, Clone)]
pub struct Series {
    /// Legend entry.
    pub label: String,
    /// Points in drawing order; non-finite points are skipped.
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Build a series from a label and points.
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Render(err.to_string())
}

fn finite(points: &[(f64, f64)]) -> impl Iterator<Item = (f64, f64)> + '_ {
    points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn bounds(points: impl Iterator<Item = (f64, f64)>) -> (Range<f64>, Range<f64>) {
    let init = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    let (x0, x1, y0, y1) = points.fold(init, |(x0, x1, y0, y1), (x, y)| {
        (x0.min(x), x1.max(x), y0.min(y), y1.max(y))
    });
    (padded(x0, x1), padded(y0, y1))
}

type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw<F>(
    path: &Path,
    axes: Axes<'_>,
    x_range: Range<f64>,
    y_range: Range<f64>,
    body: F,
) -> Result<(), ReportError>
where
    F: FnOnce(&mut Chart<'_, '_>) -> Result<(), ReportError>,
{
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(axes.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc(axes.x)
        .y_desc(axes.y)
        .draw()
        .map_err(render_err)?;

    body(&mut chart)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    root.present().map_err(render_err)?;
    Ok(())
}

/// Draw each series as a connected line.
pub fn line_chart(path: &Path, axes: Axes<'_>, series: &[Series]) -> Result<(), ReportError> {
    let (x_range, y_range) = bounds(series.iter().flat_map(|s| finite(&s.points)));
    draw(path, axes, x_range, y_range, |chart| {
        for (s, &color) in series.iter().zip(PALETTE.iter().cycle()) {
            chart
                .draw_series(LineSeries::new(finite(&s.points), &color))
                .map_err(render_err)?
                .label(s.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        Ok(())
    })
}

/// Draw integer-valued bars side by side, one group per x value.
///
/// Each series' points are `(value, height)`; bars of series `i` are offset
/// within the unit slot around each value.
pub fn bar_chart(path: &Path, axes: Axes<'_>, series: &[Series]) -> Result<(), ReportError> {
    let (_, y_range) = bounds(series.iter().flat_map(|s| finite(&s.points)));
    let (x_lo, x_hi) = series
        .iter()
        .flat_map(|s| finite(&s.points))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
            (lo.min(x), hi.max(x))
        });
    let x_range = if x_lo.is_finite() {
        (x_lo - 0.5)..(x_hi + 0.5)
    } else {
        0.0..1.0
    };
    let y_range = y_range.start.min(0.0)..y_range.end;

    let width = 0.8 / series.len().max(1) as f64;
    draw(path, axes, x_range, y_range, |chart| {
        for (i, (s, &color)) in series.iter().zip(PALETTE.iter().cycle()).enumerate() {
            let offset = -0.4 + width * i as f64;
            chart
                .draw_series(finite(&s.points).map(|(x, h)| {
                    Rectangle::new([(x + offset, 0.0), (x + offset + width, h)], color.filled())
                }))
                .map_err(render_err)?
                .label(s.label.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }
        Ok(())
    })
}

/// Draw each series as unconnected markers.
pub fn scatter_chart(path: &Path, axes: Axes<'_>, series: &[Series]) -> Result<(), ReportError> {
    let (x_range, y_range) = bounds(series.iter().flat_map(|s| finite(&s.points)));
    draw(path, axes, x_range, y_range, |chart| {
        for (s, &color) in series.iter().zip(PALETTE.iter().cycle()) {
            chart
                .draw_series(finite(&s.points).map(|p| Circle::new(p, 2, color.filled())))
                .map_err(render_err)?
                .label(s.label.as_str())
                .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
        }
        Ok(())
    })
}
