use super::StatisticsError;

/// Outcome of a two-sample Kolmogorov–Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Largest absolute distance between the two empirical CDFs.
    pub statistic: f64,
    /// Asymptotic probability of a distance at least this large when both
    /// samples come from the same distribution.
    pub p_value: f64,
}

/// Two-sample Kolmogorov–Smirnov test.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Result<KsResult, StatisticsError> {
    if a.is_empty() || b.is_empty() {
        return Err(StatisticsError::EmptySample);
    }
    if a.iter().chain(b).any(|v| !v.is_finite()) {
        return Err(StatisticsError::NonFinite);
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic = 0.0f64;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        // Step both ECDFs past every copy of `x` before comparing.
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        statistic = statistic.max((i as f64 / na - j as f64 / nb).abs());
    }

    let effective = (na * nb / (na + nb)).sqrt();
    let lambda = (effective + 0.12 + 0.11 / effective) * statistic;

    Ok(KsResult {
        statistic,
        p_value: kolmogorov_survival(lambda),
    })
}

/// `Q_KS(λ) = 2 Σ_{j≥1} (-1)^{j-1} exp(-2 j² λ²)`, clamped to `[0, 1]`.
fn kolmogorov_survival(lambda: f64) -> f64 {
    // Q → 1 below 0.2, where the series is slow to converge.
    if lambda < 0.2 {
        return 1.0;
    }

    let a2 = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut previous_term = 0.0f64;
    for j in 1..=100 {
        let term = sign * 2.0 * (a2 * (j * j) as f64).exp();
        sum += term;
        if term.abs() <= 1e-12 * previous_term.abs() || term.abs() <= 1e-16 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous_term = term;
    }
    1.0
}
