//! Table ingest and validation.
//!
//! This module is responsible for turning a caller-supplied `Frame` into clean,
//! per-row `(vintage, target)` observations that every strategy can rely on.
//!
//! Design goals:
//! - **Strict schema** for the date and target columns (clear `DataError`s)
//! - **No row skipping**: weights must stay aligned 1:1 with the input rows, so
//!   a single bad cell fails the whole call
//! - **Deterministic summaries**: grouped counts live in ordered maps

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{Column, Frame, Vintage};
use crate::error::{Result, WeightError};

/// Row and bad counts for one group of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCount {
    pub rows: usize,
    pub bad: usize,
}

impl GroupCount {
    pub fn good(&self) -> usize {
        self.rows - self.bad
    }

    /// Observed bad rate; `0.0` for an empty group.
    pub fn event_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.bad as f64 / self.rows as f64
        }
    }
}

/// Summary stats about the ingested observations.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_obs: usize,
    pub n_bad: usize,
    pub n_vintages: usize,
    pub first_vintage: Option<Vintage>,
    pub last_vintage: Option<Vintage>,
}

impl DatasetStats {
    pub fn global_event_rate(&self) -> f64 {
        GroupCount {
            rows: self.n_obs,
            bad: self.n_bad,
        }
        .event_rate()
    }
}

/// Validated per-row view of a frame.
///
/// Borrowing the frame keeps optional strategy columns (EAD, LGD) reachable
/// without copying them.
#[derive(Debug, Clone)]
pub struct Observations<'a> {
    pub frame: &'a Frame,
    pub vintages: Vec<Vintage>,
    pub targets: Vec<bool>,
    pub by_vintage: BTreeMap<Vintage, GroupCount>,
    pub stats: DatasetStats,
}

impl Observations<'_> {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Validate the date and target columns of `frame` and summarize them.
pub fn ingest<'a>(frame: &'a Frame, date_col: &str, target_col: &str) -> Result<Observations<'a>> {
    let vintages = parse_vintages(frame.require(date_col)?, date_col)?;
    let targets = parse_targets(frame.require(target_col)?, target_col)?;

    let mut by_vintage: BTreeMap<Vintage, GroupCount> = BTreeMap::new();
    for (&v, &bad) in vintages.iter().zip(&targets) {
        let group = by_vintage.entry(v).or_default();
        group.rows += 1;
        group.bad += usize::from(bad);
    }

    let stats = DatasetStats {
        n_obs: targets.len(),
        n_bad: targets.iter().filter(|&&b| b).count(),
        n_vintages: by_vintage.len(),
        first_vintage: by_vintage.keys().next().copied(),
        last_vintage: by_vintage.keys().next_back().copied(),
    };

    Ok(Observations {
        frame,
        vintages,
        targets,
        by_vintage,
        stats,
    })
}

/// Convert a date column into monthly vintages.
///
/// Accepted encodings:
/// - `Int`: `yyyymm` (e.g. `202401`)
/// - `Date`: any calendar date (truncated to its month)
/// - `Str`: `yyyymm`, `yyyy-mm`, `yyyymmdd` or `yyyy-mm-dd`
pub fn parse_vintages(column: &Column, name: &str) -> Result<Vec<Vintage>> {
    match column {
        Column::Int(values) => values
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                Vintage::from_yyyymm(v).ok_or_else(|| {
                    WeightError::data(format!(
                        "Column '{name}' row {row}: {v} is not a valid yyyymm period."
                    ))
                })
            })
            .collect(),
        Column::Date(values) => Ok(values.iter().map(|&d| Vintage::from_date(d)).collect()),
        Column::Str(values) => values
            .iter()
            .enumerate()
            .map(|(row, s)| {
                parse_period_str(s).ok_or_else(|| {
                    WeightError::data(format!(
                        "Column '{name}' row {row}: '{s}' is not a recognised period \
                         (expected yyyymm, yyyy-mm, yyyymmdd or yyyy-mm-dd)."
                    ))
                })
            })
            .collect(),
        other => Err(WeightError::data(format!(
            "Column '{name}' has type {} and cannot hold periods (expected int yyyymm, date or str).",
            other.dtype()
        ))),
    }
}

fn parse_period_str(raw: &str) -> Option<Vintage> {
    let s = raw.trim();
    let all_digits = s.bytes().all(|b| b.is_ascii_digit());
    let date = match s.len() {
        6 if all_digits => NaiveDate::parse_from_str(&format!("{s}01"), "%Y%m%d").ok(),
        8 if all_digits => NaiveDate::parse_from_str(s, "%Y%m%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok(),
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
        _ => None,
    }?;
    Some(Vintage::from_date(date))
}

/// Convert a target column into bad flags.
///
/// `Bool`, `Int` 0/1 and `Float` exactly 0.0/1.0 are accepted.
pub fn parse_targets(column: &Column, name: &str) -> Result<Vec<bool>> {
    let non_binary = |row: usize, value: String| {
        WeightError::data(format!(
            "Column '{name}' row {row}: target value {value} is not binary (0/1)."
        ))
    };

    match column {
        Column::Bool(values) => Ok(values.clone()),
        Column::Int(values) => values
            .iter()
            .enumerate()
            .map(|(row, &v)| match v {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(non_binary(row, v.to_string())),
            })
            .collect(),
        Column::Float(values) => values
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                if v == 0.0 {
                    Ok(false)
                } else if v == 1.0 {
                    Ok(true)
                } else {
                    Err(non_binary(row, v.to_string()))
                }
            })
            .collect(),
        other => Err(WeightError::data(format!(
            "Target column '{name}' has type {} (expected int, float or bool 0/1).",
            other.dtype()
        ))),
    }
}
