//! Raw-weight computation and multiplicative combination.
//!
//! Steps are computed concurrently (they only read the observations), then
//! folded into an accumulator of ones strictly in plan order. The first
//! failing step in plan order decides the returned error.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, WeightError};
use crate::io::Observations;
use crate::math::mean;
use crate::weighting::ExecutionPlan;

/// Shape of one step's raw array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub name: &'static str,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl StepSummary {
    fn of(name: &'static str, raw: &[f64]) -> Self {
        if raw.is_empty() {
            return Self { name, mean: 0.0, min: 0.0, max: 0.0 };
        }
        let (min, max) = raw
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| (lo.min(w), hi.max(w)));
        Self {
            name,
            mean: mean(raw).unwrap_or(0.0),
            min,
            max,
        }
    }
}

/// Combined raw weights plus per-step diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    pub weights: Vec<f64>,
    pub steps: Vec<StepSummary>,
}

fn check_raw(name: &str, raw: &[f64], n_rows: usize) -> Result<()> {
    if raw.len() != n_rows {
        return Err(WeightError::data(format!(
            "{name}: produced {} weights for {n_rows} rows.",
            raw.len()
        )));
    }
    if let Some((row, w)) = raw.iter().enumerate().find(|(_, w)| !(w.is_finite() && **w >= 0.0)) {
        return Err(WeightError::data(format!(
            "{name}: row {row} has invalid raw weight {w}."
        )));
    }
    Ok(())
}

pub fn combine(plan: &ExecutionPlan, obs: &Observations) -> Result<Combined> {
    let raws: Vec<Result<Vec<f64>>> = plan
        .steps()
        .par_iter()
        .map(|strategy| strategy.raw_weights(obs))
        .collect();

    let mut weights = vec![1.0; obs.len()];
    let mut steps = Vec::with_capacity(raws.len());
    for (strategy, raw) in plan.steps().iter().zip(raws) {
        let name = strategy.name();
        let raw = raw?;
        check_raw(name, &raw, obs.len())?;

        let summary = StepSummary::of(name, &raw);
        debug!(
            strategy = name,
            mean = summary.mean,
            min = summary.min,
            max = summary.max,
            "raw weights"
        );

        for (acc, w) in weights.iter_mut().zip(&raw) {
            *acc *= w;
        }
        steps.push(summary);
    }

    Ok(Combined { weights, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Frame};
    use crate::io::ingest;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn toy() -> Frame {
        Frame::new()
            .with_column("vint", Column::Int(vec![202401, 202401, 202402, 202402, 202402]))
            .unwrap()
            .with_column("bad", Column::Int(vec![1, 0, 1, 0, 0]))
            .unwrap()
    }

    fn plan(value: serde_json::Value) -> ExecutionPlan {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_value(value).unwrap();
        ExecutionPlan::resolve(&map).unwrap()
    }

    #[test]
    fn product_of_raw_arrays() {
        let f = toy();
        let obs = ingest(&f, "vint", "bad").unwrap();
        let combined = combine(
            &plan(json!({
                "balanced": {},
                "recency_decay": {"half_life": 1},
                "combo": {"order": ["balanced", "recency_decay"]}
            })),
            &obs,
        )
        .unwrap();

        // balanced: bads 2.5/2, goods 2.5/3; decay: 0.5 for 2024-01.
        let expected = [1.25 * 0.5, 2.5 / 3.0 * 0.5, 1.25, 2.5 / 3.0, 2.5 / 3.0];
        for (a, b) in combined.weights.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(combined.steps.len(), 2);
        assert_eq!(combined.steps[1].name, "recency_decay");
        assert_eq!(combined.steps[1].max, 1.0);
        assert_eq!(combined.steps[1].min, 0.5);
    }

    #[test]
    fn first_failing_step_in_order_wins() {
        let f = Frame::new()
            .with_column("vint", Column::Int(vec![202401, 202402]))
            .unwrap()
            .with_column("bad", Column::Int(vec![0, 0]))
            .unwrap();
        let obs = ingest(&f, "vint", "bad").unwrap();
        let err = combine(
            &plan(json!({
                "balanced": {},
                "expected_loss": {"ead_col": "ead"},
                "combo": {"order": ["expected_loss", "balanced"]}
            })),
            &obs,
        )
        .unwrap_err();
        assert!(matches!(err, WeightError::Configuration(_)));
        assert!(err.to_string().contains("ead"));
    }

    #[test]
    fn raw_check_rejects_bad_values() {
        assert!(check_raw("x", &[1.0, 2.0], 3).is_err());
        assert!(check_raw("x", &[1.0, -0.5], 2).is_err());
        assert!(check_raw("x", &[1.0, f64::NAN], 2).is_err());
        assert!(check_raw("x", &[0.0, 2.0], 2).is_ok());
    }
}
