//! `EVER` / `OVER` delinquency targets.
//!
//! A target name has the shape `<EVER|OVER><dpd><unit><h>`, e.g. `EVER30M4`.
//! With a window of `w` rows per id:
//! - `EVER`: dpd reached the threshold in the current row or the next `w - 1` rows
//! - `OVER`: dpd reached the threshold in the current row or the previous `w - 1` rows
//!
//! Units `M`, `Q`, `Y`, `D` stand for 1, 3, 12 and 1 month(s). The horizon
//! `h * unit` months is converted into rows of the panel's base frequency
//! (one row per month by default), so `w = h * unit / base`.

use std::fmt;

use crate::builders::{FrameBuilder, numeric, panel_order};
use crate::domain::{Column, Frame};
use crate::error::{Result, WeightError};
use crate::io::parse_vintages;

const DEFAULT_TARGETS: [&str; 6] = ["EVER30M4", "EVER60M6", "EVER90M12", "OVER30M4", "OVER60M6", "OVER90M12"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Look ahead.
    Ever,
    /// Look back.
    Over,
}

/// Spacing of consecutive panel rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// `M`, `Q` or `Y` (case-insensitive); `D` is read as monthly.
    pub fn parse(code: &str) -> Result<Self> {
        match code.to_ascii_uppercase().as_str() {
            "M" | "D" => Ok(Frequency::Monthly),
            "Q" => Ok(Frequency::Quarterly),
            "Y" => Ok(Frequency::Yearly),
            _ => Err(WeightError::config(format!(
                "Invalid frequency '{code}'. Use M, Q, Y or D."
            ))),
        }
    }

    pub fn months(self) -> usize {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Yearly => 12,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Yearly => "Y",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetRule {
    pub name: String,
    pub window: Window,
    pub threshold: f64,
    pub horizon_months: usize,
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

impl TargetRule {
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || {
            WeightError::config(format!(
                "Invalid target name '{name}'. Use EVER/OVER + <dpd> + M/Q/Y/D + <horizon>."
            ))
        };

        let upper = name.to_ascii_uppercase();
        let (window, rest) = if let Some(rest) = upper.strip_prefix("EVER") {
            (Window::Ever, rest)
        } else if let Some(rest) = upper.strip_prefix("OVER") {
            (Window::Over, rest)
        } else {
            return Err(invalid());
        };

        let (dpd, rest) = split_digits(rest);
        let mut chars = rest.chars();
        let unit_months = match chars.next() {
            Some('M' | 'D') => 1,
            Some('Q') => 3,
            Some('Y') => 12,
            _ => return Err(invalid()),
        };
        let h = chars.as_str();
        if dpd.is_empty() || h.is_empty() || !h.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let threshold: u32 = dpd.parse().map_err(|_| invalid())?;
        let h: usize = h.parse().map_err(|_| invalid())?;
        if h == 0 {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            window,
            threshold: f64::from(threshold),
            horizon_months: h * unit_months,
        })
    }

    /// Window length in rows of a panel sampled at `freq`.
    pub fn window_rows(&self, freq: Frequency) -> Result<usize> {
        let base = freq.months();
        if self.horizon_months % base != 0 {
            return Err(WeightError::config(format!(
                "Horizon of {} ({} months) is not a multiple of the base frequency {freq}.",
                self.name, self.horizon_months
            )));
        }
        Ok(self.horizon_months / base)
    }

    /// Target values for one id's rows (already in period order).
    fn apply(&self, flags: &[bool], rows: usize) -> Vec<i64> {
        let n = flags.len();
        (0..n)
            .map(|i| {
                let (lo, hi) = match self.window {
                    Window::Ever => (i, (i + rows).min(n)),
                    Window::Over => ((i + 1).saturating_sub(rows), i + 1),
                };
                i64::from(flags[lo..hi].iter().any(|&f| f))
            })
            .collect()
    }
}

/// Adds delinquency target columns to a panel.
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    id_col: String,
    date_col: String,
    dpd_col: String,
    freq: Frequency,
    rules: Vec<TargetRule>,
}

impl TargetBuilder {
    /// Builder with the default target set.
    pub fn new(id_col: impl Into<String>, date_col: impl Into<String>) -> Self {
        let rules = DEFAULT_TARGETS
            .iter()
            .filter_map(|name| TargetRule::parse(name).ok())
            .collect();
        Self {
            id_col: id_col.into(),
            date_col: date_col.into(),
            dpd_col: "dpd".to_string(),
            freq: Frequency::Monthly,
            rules,
        }
    }

    pub fn dpd_col(mut self, name: impl Into<String>) -> Self {
        self.dpd_col = name.into();
        self
    }

    /// Base period of the panel rows. Rule horizons are checked against it
    /// by `targets` and `transform`.
    pub fn freq(mut self, freq: Frequency) -> Self {
        self.freq = freq;
        self
    }

    /// Replace the target set.
    pub fn targets<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = names
            .into_iter()
            .map(|n| TargetRule::parse(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if rules.is_empty() {
            return Err(WeightError::config("No targets requested."));
        }
        for rule in &rules {
            rule.window_rows(self.freq)?;
        }
        self.rules = rules;
        Ok(self)
    }

    pub fn rules(&self) -> &[TargetRule] {
        &self.rules
    }
}

impl FrameBuilder for TargetBuilder {
    /// Sort by `(id, date)`, rewrite the date column as month-start dates and
    /// append one `Int` 0/1 column per target.
    fn transform(&self, frame: &Frame) -> Result<Frame> {
        let windows = self
            .rules
            .iter()
            .map(|rule| rule.window_rows(self.freq))
            .collect::<Result<Vec<_>>>()?;
        let periods = parse_vintages(frame.require(&self.date_col)?, &self.date_col)?;
        let ids = frame.require(&self.id_col)?;
        let dpd = numeric(frame, &self.dpd_col)?;

        let (order, blocks) = panel_order(ids, &periods);
        let mut out = frame.take_rows(&order);

        let dates = order
            .iter()
            .map(|&row| {
                periods[row].first_day().ok_or_else(|| {
                    WeightError::data(format!(
                        "Column '{}' row {row}: period {} has no calendar date.",
                        self.date_col, periods[row]
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        out.insert(self.date_col.as_str(), Column::Date(dates))?;

        let sorted_dpd: Vec<f64> = order.iter().map(|&row| dpd[row]).collect();
        for (rule, &rows) in self.rules.iter().zip(&windows) {
            let flags: Vec<bool> = sorted_dpd.iter().map(|&d| d >= rule.threshold).collect();
            let mut values = Vec::with_capacity(flags.len());
            for &(start, end) in &blocks {
                values.extend(rule.apply(&flags[start..end], rows));
            }
            out.insert(rule.name.as_str(), Column::Int(values))?;
        }
        Ok(out)
    }
}
