use super::StatisticsError;

/// Equal-width histogram over a sample.
///
/// Bins span `[min, max]` of the sample; every bin is half-open except the
/// last, which includes its right edge. A sample whose values are all equal
/// is binned over `[v - 0.5, v + 0.5]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins.
    pub fn new(values: &[f64], bins: usize) -> Result<Self, StatisticsError> {
        if bins == 0 {
            return Err(StatisticsError::ZeroBins);
        }
        if values.is_empty() {
            return Err(StatisticsError::EmptySample);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StatisticsError::NonFinite);
        }

        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        Self::with_range(values, bins, lo, hi)
    }

    /// One unit-width bin per integer value from 0 to the sample maximum.
    ///
    /// Bin `k` spans `[k - 0.5, k + 0.5)` so that its centre is the count.
    pub fn integer(values: &[u64]) -> Result<Self, StatisticsError> {
        let max = values.iter().copied().max().ok_or(StatisticsError::EmptySample)?;
        let bins = max as usize + 1;
        let edges = (0..=bins).map(|k| k as f64 - 0.5).collect();
        let mut counts = vec![0u64; bins];
        for &v in values {
            counts[v as usize] += 1;
        }
        Ok(Self { edges, counts })
    }

    fn with_range(
        values: &[f64],
        bins: usize,
        lo: f64,
        hi: f64,
    ) -> Result<Self, StatisticsError> {
        let width = (hi - lo) / bins as f64;
        // A range wider than f64::MAX has no finite bin width.
        if !width.is_finite() {
            return Err(StatisticsError::NonFinite);
        }
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0u64; bins];
        for &v in values {
            let slot = ((v - lo) / width) as usize;
            counts[slot.min(bins - 1)] += 1;
        }
        Ok(Self { edges, counts })
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Bin edges (`bins + 1` values).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Left edge of every bin.
    pub fn left_edges(&self) -> &[f64] {
        &self.edges[..self.counts.len()]
    }

    /// Midpoint of every bin.
    pub fn centres(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Per-bin counts.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of binned values.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Probability density per bin: `count / (total * width)`.
    pub fn density(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts
            .iter()
            .zip(self.edges.windows(2))
            .map(|(&count, w)| count as f64 / (total * (w[1] - w[0])))
            .collect()
    }

    /// Fraction of values at or above each bin: the reverse cumulative sum
    /// divided by its maximum.
    pub fn cumulative_tail(&self) -> Vec<f64> {
        let mut tail: Vec<f64> = self
            .counts
            .iter()
            .rev()
            .scan(0u64, |acc, &c| {
                *acc += c;
                Some(*acc as f64)
            })
            .collect();
        tail.reverse();
        let max = tail.first().copied().unwrap_or(0.0);
        if max > 0.0 {
            for value in &mut tail {
                *value /= max;
            }
        }
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximum_lands_in_last_bin() {
        let hist = Histogram::new(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(hist.counts(), &[1, 1, 1, 2]);
        assert_eq!(hist.edges(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.total(), 5);
    }

    #[test]
    fn constant_sample_widens_range() {
        let hist = Histogram::new(&[2.0, 2.0, 2.0], 2).unwrap();
        assert_eq!(hist.edges(), &[1.5, 2.0, 2.5]);
        assert_eq!(hist.counts(), &[0, 3]);
    }

    #[test]
    fn density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin()).collect();
        let hist = Histogram::new(&values, 10).unwrap();
        let area: f64 = hist
            .density()
            .iter()
            .zip(hist.edges().windows(2))
            .map(|(d, w)| d * (w[1] - w[0]))
            .sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn integer_histogram_has_bin_per_value() {
        let hist = Histogram::integer(&[0, 1, 1, 3]).unwrap();
        assert_eq!(hist.counts(), &[1, 2, 0, 1]);
        assert_eq!(hist.centres(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn cumulative_tail_is_normalised() {
        let hist = Histogram::integer(&[0, 1, 1, 3]).unwrap();
        assert_eq!(hist.cumulative_tail(), vec![1.0, 0.75, 0.25, 0.25]);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert_eq!(Histogram::new(&[], 3).unwrap_err(), StatisticsError::EmptySample);
        assert_eq!(Histogram::new(&[1.0], 0).unwrap_err(), StatisticsError::ZeroBins);
        assert_eq!(
            Histogram::new(&[1.0, f64::NAN], 3).unwrap_err(),
            StatisticsError::NonFinite
        );
        assert!(Histogram::integer(&[]).is_err());
    }

    #[test]
    fn overflowing_range_is_rejected() {
        assert_eq!(
            Histogram::new(&[-1e308, 1e308], 4).unwrap_err(),
            StatisticsError::NonFinite
        );
        // Wide but representable ranges still bin normally.
        let hist = Histogram::new(&[-1e307, 1e307], 2).unwrap();
        assert_eq!(hist.counts(), &[1, 1]);
    }
}
