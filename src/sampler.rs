//! `RiskSampler`: the single entry point of the weighting engine.
//!
//! Workflow per call:
//! column checks -> ingest -> per-strategy raw weights -> combination -> normalization
//!
//! The sampler owns only its validated configuration, so one instance can be
//! shared across threads and reused on unrelated tables.

use tracing::info;

use crate::domain::{Frame, SamplerConfig};
use crate::error::{Result, WeightError};
use crate::io::ingest;
use crate::report::{self, AuditReport};
use crate::weighting::{ExecutionPlan, NormalizationSummary, StepSummary, combine, normalize};

/// Final weights of one run, with the diagnostics collected along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRun {
    /// One weight per input row, mean 1.
    pub weights: Vec<f64>,
    /// Raw-array summaries, in plan order.
    pub steps: Vec<StepSummary>,
    pub normalization: NormalizationSummary,
}

#[derive(Debug, Clone)]
pub struct RiskSampler {
    config: SamplerConfig,
    plan: ExecutionPlan,
}

impl RiskSampler {
    /// Validate the configuration and resolve the execution plan.
    ///
    /// Every configuration problem surfaces here, before any table is seen.
    pub fn new(config: SamplerConfig) -> Result<Self> {
        for (field, value) in [("date_col", &config.date_col), ("target_col", &config.target_col)] {
            if value.trim().is_empty() {
                return Err(WeightError::config(format!("{field} must be a non-empty column name.")));
            }
        }
        if config.id_cols.iter().any(|c| c.trim().is_empty()) {
            return Err(WeightError::config("id_cols must not contain empty column names."));
        }
        if config.strategies.is_empty() {
            return Err(WeightError::config("strategies must not be empty."));
        }
        if let Some(cap) = config.cap {
            cap.validate()?;
        }

        let plan = ExecutionPlan::resolve(&config.strategies)?;
        Ok(Self { config, plan })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::new(SamplerConfig::from_json(text)?)
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Compute the final weight vector, aligned 1:1 with the rows of `frame`.
    pub fn fit_transform(&self, frame: &Frame) -> Result<Vec<f64>> {
        self.run(frame).map(|run| run.weights)
    }

    /// Like `fit_transform`, but keeps per-step and normalization diagnostics.
    pub fn run(&self, frame: &Frame) -> Result<WeightRun> {
        // 1) Column presence, before any strategy runs.
        self.check_columns(frame)?;

        // 2) Per-row vintages and targets.
        let obs = ingest(frame, &self.config.date_col, &self.config.target_col)?;
        if obs.is_empty() {
            return Err(WeightError::degenerate("Input table has no rows."));
        }
        info!(
            rows = obs.len(),
            vintages = obs.stats.n_vintages,
            event_rate = obs.stats.global_event_rate(),
            plan = ?self.plan.names(),
            "computing sample weights"
        );

        // 3) Raw arrays, folded in plan order.
        let combined = combine(&self.plan, &obs)?;

        // 4) Mean 1, then cap.
        let normalized = normalize(combined.weights, self.config.cap)?;

        Ok(WeightRun {
            weights: normalized.weights,
            steps: combined.steps,
            normalization: normalized.summary,
        })
    }

    /// Diagnostics for a weight vector produced for `frame`.
    pub fn audit_report(&self, frame: &Frame, weights: &[f64]) -> Result<AuditReport> {
        report::audit(frame, weights, &self.config)
    }

    fn check_columns(&self, frame: &Frame) -> Result<()> {
        frame.require(&self.config.date_col)?;
        frame.require(&self.config.target_col)?;
        for col in &self.config.id_cols {
            frame.require(col)?;
        }
        for strategy in self.plan.steps() {
            for col in strategy.required_columns() {
                if !frame.contains(col) {
                    return Err(WeightError::config(format!(
                        "{}: configured column '{col}' is not present in the table.",
                        strategy.name()
                    )));
                }
            }
        }
        Ok(())
    }
}
