//! Weight audit: how a produced weight vector reshapes the table.
//!
//! The audit only reads the table and the weights; it never feeds back into
//! weight computation.

pub mod format;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{Cap, CellKey, Frame, SamplerConfig, Vintage};
use crate::error::{Result, WeightError};
use crate::io::ingest;
use crate::math::{KsTest, effective_sample_size, ks_two_sample, mean, quantile_sorted, sorted, std_dev};

pub use format::format_audit;

/// Distribution moments of the weight vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightMoments {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p99: f64,
    pub zeros: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VintageAudit {
    pub vintage: Vintage,
    pub rows: usize,
    pub bads: usize,
    pub weight_sum: f64,
    pub raw_event_rate: f64,
    pub weighted_event_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAudit {
    pub target: u8,
    pub rows: usize,
    pub weight_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub n_rows: usize,
    pub moments: WeightMoments,
    /// Kish effective sample size.
    pub effective_sample_size: f64,
    pub vintages: Vec<VintageAudit>,
    pub classes: Vec<ClassAudit>,
    pub raw_event_rate: f64,
    pub weighted_event_rate: f64,
    /// Weights vs. the uniform (all ones) baseline; `None` for an empty table.
    pub ks: Option<KsTest>,
    pub cap: Option<Cap>,
    /// Distinct identifier tuples over `id_cols`, when configured.
    pub distinct_ids: Option<usize>,
}

impl AuditReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| WeightError::data(format!("Failed to serialize audit report: {e}")))
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

fn moments(weights: &[f64]) -> WeightMoments {
    let s = sorted(weights);
    WeightMoments {
        mean: mean(weights).unwrap_or(0.0),
        std: std_dev(weights).unwrap_or(0.0),
        min: s.first().copied().unwrap_or(0.0),
        max: s.last().copied().unwrap_or(0.0),
        median: quantile_sorted(&s, 0.5).unwrap_or(0.0),
        p99: quantile_sorted(&s, 0.99).unwrap_or(0.0),
        zeros: weights.iter().filter(|&&w| w == 0.0).count(),
    }
}

fn distinct_ids(frame: &Frame, id_cols: &[String]) -> Result<Option<usize>> {
    if id_cols.is_empty() {
        return Ok(None);
    }
    let columns = id_cols
        .iter()
        .map(|c| frame.require(c))
        .collect::<Result<Vec<_>>>()?;
    let ids: BTreeSet<Vec<CellKey>> = (0..frame.n_rows())
        .map(|row| columns.iter().map(|c| c.key(row)).collect())
        .collect();
    Ok(Some(ids.len()))
}

/// Build the audit report for `weights` produced on `frame`.
pub fn audit(frame: &Frame, weights: &[f64], config: &SamplerConfig) -> Result<AuditReport> {
    if weights.len() != frame.n_rows() {
        return Err(WeightError::data(format!(
            "Weight vector has {} entries, table has {} rows.",
            weights.len(),
            frame.n_rows()
        )));
    }
    if let Some((row, w)) = weights.iter().enumerate().find(|(_, w)| !(w.is_finite() && **w >= 0.0)) {
        return Err(WeightError::data(format!("Weight at row {row} is invalid: {w}.")));
    }

    let obs = ingest(frame, &config.date_col, &config.target_col)?;

    let mut by_vintage: BTreeMap<Vintage, (f64, f64)> = BTreeMap::new();
    let mut class_mass = [0.0_f64; 2];
    for ((&vintage, &bad), &w) in obs.vintages.iter().zip(&obs.targets).zip(weights) {
        let entry = by_vintage.entry(vintage).or_default();
        entry.0 += w;
        if bad {
            entry.1 += w;
        }
        class_mass[usize::from(bad)] += w;
    }

    let vintages = obs
        .by_vintage
        .iter()
        .map(|(&vintage, group)| {
            let (weight_sum, bad_mass) = by_vintage.get(&vintage).copied().unwrap_or_default();
            VintageAudit {
                vintage,
                rows: group.rows,
                bads: group.bad,
                weight_sum,
                raw_event_rate: group.event_rate(),
                weighted_event_rate: ratio(bad_mass, weight_sum),
            }
        })
        .collect();

    let n_bad = obs.stats.n_bad;
    let classes = vec![
        ClassAudit {
            target: 0,
            rows: obs.len() - n_bad,
            weight_sum: class_mass[0],
        },
        ClassAudit {
            target: 1,
            rows: n_bad,
            weight_sum: class_mass[1],
        },
    ];

    let baseline = vec![1.0; weights.len()];
    Ok(AuditReport {
        n_rows: weights.len(),
        moments: moments(weights),
        effective_sample_size: effective_sample_size(weights),
        vintages,
        classes,
        raw_event_rate: obs.stats.global_event_rate(),
        weighted_event_rate: ratio(class_mass[1], class_mass[0] + class_mass[1]),
        ks: ks_two_sample(weights, &baseline),
        cap: config.cap,
        distinct_ids: distinct_ids(frame, &config.id_cols)?,
    })
}
