//! Descriptive statistics on weight vectors.
//!
//! Everything here sums in index order, so results are bit-reproducible for a
//! given input slice.

use serde::Serialize;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation; `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Sorted copy (total order, so NaN cannot poison the sort).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile of an already sorted slice, linear interpolation between order
/// statistics (position `q * (n - 1)`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Kish effective sample size: `(Σw)² / Σw²`.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum: f64 = weights.iter().sum();
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum_sq <= 0.0 { 0.0 } else { sum * sum / sum_sq }
}

/// Result of a two-sample Kolmogorov–Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sample KS test with the asymptotic (Kolmogorov) p-value.
///
/// Returns `None` if either sample is empty.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<KsTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let a = sorted(a);
    let b = sorted(b);
    let (n, m) = (a.len(), b.len());

    // Walk both ECDFs over the merged support; once one side is exhausted the
    // gap can only shrink.
    let (mut i, mut j) = (0usize, 0usize);
    let mut d = 0.0_f64;
    while i < n && j < m {
        let x = if a[i].total_cmp(&b[j]).is_le() { a[i] } else { b[j] };
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        let gap = (i as f64 / n as f64 - j as f64 / m as f64).abs();
        d = d.max(gap);
    }

    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    let p_value = kolmogorov_survival((en + 0.12 + 0.11 / en) * d);
    Some(KsTest { statistic: d, p_value })
}

/// `P(K > lambda)` for the Kolmogorov distribution (alternating series).
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    const EPS_TERM: f64 = 1e-3;
    const EPS_SUM: f64 = 1e-8;

    if !lambda.is_finite() {
        return 0.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0_f64;
    for j in 1..=100 {
        let jf = j as f64;
        let term = fac * (a2 * jf * jf).exp();
        sum += term;
        if term.abs() <= EPS_TERM * prev_term || term.abs() <= EPS_SUM * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        prev_term = term.abs();
    }
    // No convergence: lambda is tiny and the samples are indistinguishable.
    1.0
}
