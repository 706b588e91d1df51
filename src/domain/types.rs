//! Shared domain types.
//!
//! This module defines:
//!
//! - the monthly period used to group observations (`Vintage`)
//! - the weight ceiling (`Cap`)
//! - the sampler configuration record (`SamplerConfig`)

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, WeightError};

/// Ceiling applied when `cap` is omitted from the configuration.
pub const DEFAULT_CAP: f64 = 10.0;

/// Default half-life (in months) for `recency_decay` when neither
/// `half_life` nor `lambda` is given.
pub const DEFAULT_HALF_LIFE: f64 = 6.0;

/// A monthly period, stored as a month ordinal (`year * 12 + month - 1`).
///
/// Ordinal distance between two vintages is their age difference in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vintage(i32);

impl Vintage {
    /// Build from a calendar year and a 1-based month.
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Vintage(year.checked_mul(12)?.checked_add(month as i32 - 1)?))
    }

    /// Build from an integer `yyyymm` (e.g. `202401`).
    pub fn from_yyyymm(value: i64) -> Option<Self> {
        if !(100..=99_999_912).contains(&value) {
            return None;
        }
        let year = i32::try_from(value / 100).ok()?;
        let month = u32::try_from(value % 100).ok()?;
        Self::from_ym(year, month)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Vintage(date.year() * 12 + date.month0() as i32)
    }

    pub fn ordinal(self) -> i32 {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.div_euclid(12)
    }

    pub fn month(self) -> u32 {
        self.0.rem_euclid(12) as u32 + 1
    }

    /// Months from `self` to `later` (negative if `later` is earlier).
    pub fn months_until(self, later: Vintage) -> i32 {
        later.0 - self.0
    }

    /// First calendar day of the period.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
    }
}

impl fmt::Display for Vintage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for Vintage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Upper bound imposed on the mean-1 weights before the final renormalization.
///
/// In JSON a bare number is an absolute ceiling; `{"quantile": q}` is a
/// quantile of the normalized weight distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cap {
    /// Clip every weight to at most this value (`> 0`).
    Absolute(f64),
    /// Clip to the `quantile` (in `(0, 1]`) of the normalized weights.
    Quantile { quantile: f64 },
}

impl Cap {
    pub fn validate(self) -> Result<Self> {
        match self {
            Cap::Absolute(c) if c.is_finite() && c > 0.0 => Ok(self),
            Cap::Absolute(c) => Err(WeightError::config(format!(
                "cap must be a positive finite number, got {c}."
            ))),
            Cap::Quantile { quantile } if quantile.is_finite() && quantile > 0.0 && quantile <= 1.0 => {
                Ok(self)
            }
            Cap::Quantile { quantile } => Err(WeightError::config(format!(
                "cap quantile must lie in (0, 1], got {quantile}."
            ))),
        }
    }
}

fn default_cap() -> Option<Cap> {
    Some(Cap::Absolute(DEFAULT_CAP))
}

/// Sampler configuration as supplied by the caller.
///
/// `strategies` maps a strategy name to its raw parameter object; parameters
/// are parsed and validated into typed records when a `RiskSampler` is built.
///
/// Omitting `cap` selects `Cap::Absolute(DEFAULT_CAP)`; an explicit `null`
/// disables capping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    pub date_col: String,
    pub target_col: String,
    /// Identifier columns; only used for validation and auditing.
    #[serde(default)]
    pub id_cols: Vec<String>,
    pub strategies: BTreeMap<String, Value>,
    #[serde(default = "default_cap")]
    pub cap: Option<Cap>,
}

impl SamplerConfig {
    pub fn new(date_col: impl Into<String>, target_col: impl Into<String>) -> Self {
        Self {
            date_col: date_col.into(),
            target_col: target_col.into(),
            id_cols: Vec::new(),
            strategies: BTreeMap::new(),
            cap: default_cap(),
        }
    }

    /// Declare a strategy with its parameter object (`json!({})` for none).
    pub fn strategy(mut self, name: impl Into<String>, params: Value) -> Self {
        self.strategies.insert(name.into(), params);
        self
    }

    pub fn cap(mut self, cap: Option<Cap>) -> Self {
        self.cap = cap;
        self
    }

    pub fn id_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| WeightError::config(format!("Invalid sampler configuration: {e}")))
    }
}
