//! Strategy lookup: name + JSON parameters -> typed `Strategy`.
//!
//! Parameter objects are strict: unknown keys and out-of-range values are
//! configuration errors, raised before any data is touched.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{DecayRate, Strategy};
use crate::domain::DEFAULT_HALF_LIFE;
use crate::error::{Result, WeightError};

/// Reserved key holding the combination order.
pub const COMBO: &str = "combo";

pub const STRATEGY_NAMES: [&str; 6] = [
    "balanced",
    "equal_vintage",
    "stabilise_er",
    "recency_decay",
    "expected_loss",
    "stratified_bootstrap",
];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StabiliseErParams {
    target_er: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecencyDecayParams {
    half_life: Option<f64>,
    #[serde(alias = "lambda_")]
    lambda: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpectedLossParams {
    ead_col: String,
    lgd_col: Option<String>,
    /// Accepted for compatibility; the final mean-1 normalization already
    /// removes any constant scale, so the flag has no effect.
    #[serde(default)]
    #[allow(dead_code)]
    scale_to_mean: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BootstrapParams {
    random_state: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ComboParams {
    pub order: Vec<String>,
}

/// Deserialize a parameter object; `null` counts as `{}`.
fn parse<T: DeserializeOwned>(name: &str, params: &Value) -> Result<T> {
    let value = match params {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value)
        .map_err(|e| WeightError::config(format!("Invalid parameters for '{name}': {e}")))
}

fn positive(name: &str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(WeightError::config(format!(
            "'{name}': {field} must be a positive finite number, got {value}."
        )))
    }
}

fn non_empty(name: &str, field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        Err(WeightError::config(format!("'{name}': {field} must be a non-empty column name.")))
    } else {
        Ok(value)
    }
}

pub(crate) fn parse_combo(params: &Value) -> Result<ComboParams> {
    parse(COMBO, params)
}

/// Resolve a registered strategy name and validate its parameters.
pub fn lookup(name: &str, params: &Value) -> Result<Strategy> {
    match name {
        "balanced" => parse::<NoParams>(name, params).map(|_| Strategy::Balanced),
        "equal_vintage" => parse::<NoParams>(name, params).map(|_| Strategy::EqualVintage),
        "stabilise_er" => {
            let p: StabiliseErParams = parse(name, params)?;
            if let Some(t) = p.target_er {
                if !(t.is_finite() && t > 0.0 && t < 1.0) {
                    return Err(WeightError::config(format!(
                        "'{name}': target_er must lie strictly between 0 and 1, got {t}."
                    )));
                }
            }
            Ok(Strategy::StabiliseEr { target_er: p.target_er })
        }
        "recency_decay" => {
            let p: RecencyDecayParams = parse(name, params)?;
            let rate = match (p.half_life, p.lambda) {
                (Some(_), Some(_)) => {
                    return Err(WeightError::config(format!(
                        "'{name}': give either half_life or lambda, not both."
                    )));
                }
                (Some(h), None) => DecayRate::HalfLife(positive(name, "half_life", h)?),
                (None, Some(l)) => DecayRate::Lambda(positive(name, "lambda", l)?),
                (None, None) => DecayRate::HalfLife(DEFAULT_HALF_LIFE),
            };
            Ok(Strategy::RecencyDecay(rate))
        }
        "expected_loss" => {
            let p: ExpectedLossParams = parse(name, params)?;
            Ok(Strategy::ExpectedLoss {
                ead_col: non_empty(name, "ead_col", p.ead_col)?,
                lgd_col: p.lgd_col.map(|c| non_empty(name, "lgd_col", c)).transpose()?,
            })
        }
        "stratified_bootstrap" => {
            let p: BootstrapParams = parse(name, params)?;
            Ok(Strategy::StratifiedBootstrap {
                random_state: p.random_state,
            })
        }
        _ => Err(WeightError::config(format!(
            "Unknown strategy '{name}'. Known strategies: {}.",
            STRATEGY_NAMES.join(", ")
        ))),
    }
}
