//! Normalization and capping of the combined weights.
//!
//! `rescale -> clip -> rescale`. The second rescale restores mean 1 after
//! clipping, so a few weights may end up marginally above the ceiling again.

use serde::Serialize;
use tracing::warn;

use crate::domain::Cap;
use crate::error::{Result, WeightError};
use crate::math::{mean, quantile_sorted, sorted};

/// What the normalizer did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationSummary {
    /// Mean of the combined raw weights before rescaling.
    pub pre_scale_mean: f64,
    /// Ceiling applied to the mean-1 weights, if capping is enabled.
    pub cap_threshold: Option<f64>,
    /// Rows whose weight was clipped to the ceiling.
    pub clipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub weights: Vec<f64>,
    pub summary: NormalizationSummary,
}

/// Divide every weight by the mean; returns the mean used.
pub fn rescale_to_unit_mean(weights: &mut [f64]) -> Result<f64> {
    let m = mean(weights).ok_or_else(|| WeightError::degenerate("Cannot normalise an empty weight vector."))?;
    if !(m.is_finite() && m > 0.0) {
        return Err(WeightError::degenerate(format!(
            "Combined weights have mean {m}; cannot rescale to mean 1."
        )));
    }
    for w in weights.iter_mut() {
        *w /= m;
    }
    Ok(m)
}

/// Resolve a cap into a ceiling for the given mean-1 weights.
pub fn cap_threshold(weights: &[f64], cap: Cap) -> Result<f64> {
    match cap {
        Cap::Absolute(c) => Ok(c),
        Cap::Quantile { quantile } => {
            let t = quantile_sorted(&sorted(weights), quantile).ok_or_else(|| {
                WeightError::degenerate(format!("Cap quantile {quantile} is undefined for these weights."))
            })?;
            if t > 0.0 {
                Ok(t)
            } else {
                Err(WeightError::degenerate(format!(
                    "Cap quantile {quantile} resolves to {t}; clipping would zero every weight."
                )))
            }
        }
    }
}

/// Clip in place; returns the number of clipped rows.
pub fn clip(weights: &mut [f64], ceiling: f64) -> usize {
    let mut clipped = 0;
    for w in weights.iter_mut() {
        if *w > ceiling {
            *w = ceiling;
            clipped += 1;
        }
    }
    clipped
}

pub fn normalize(raw: Vec<f64>, cap: Option<Cap>) -> Result<Normalized> {
    let mut weights = raw;
    let pre_scale_mean = rescale_to_unit_mean(&mut weights)?;

    let (cap_threshold, clipped) = match cap {
        None => (None, 0),
        Some(cap) => {
            let ceiling = cap_threshold(&weights, cap)?;
            let clipped = clip(&mut weights, ceiling);
            if clipped > 0 {
                warn!(clipped, ceiling, "cap clipped weights; renormalizing");
                rescale_to_unit_mean(&mut weights)?;
            }
            (Some(ceiling), clipped)
        }
    };

    Ok(Normalized {
        weights,
        summary: NormalizationSummary {
            pre_scale_mean,
            cap_threshold,
            clipped,
        },
    })
}
