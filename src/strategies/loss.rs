//! Expected-loss weighting (`expected_loss`): `EAD * LGD` per row.
//!
//! No scale correction here; the normalizer rescales the combined vector.

use crate::domain::Frame;
use crate::error::{Result, WeightError};
use crate::io::Observations;

/// Numeric, non-negative, finite values of a configured column.
fn loss_column(frame: &Frame, name: &str) -> Result<Vec<f64>> {
    let column = frame.column(name).ok_or_else(|| {
        WeightError::config(format!(
            "expected_loss: configured column '{name}' is not present in the table."
        ))
    })?;
    let values = column.to_f64_vec().ok_or_else(|| {
        WeightError::data(format!(
            "expected_loss: column '{name}' has type {} (expected numeric).",
            column.dtype()
        ))
    })?;
    if let Some((row, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
    {
        return Err(WeightError::data(format!(
            "expected_loss: column '{name}' row {row}: {v} is not a non-negative finite number."
        )));
    }
    Ok(values)
}

/// `expected_loss` raw weights; EAD alone when no LGD column is configured.
pub fn expected_loss(obs: &Observations, ead_col: &str, lgd_col: Option<&str>) -> Result<Vec<f64>> {
    let mut weights = loss_column(obs.frame, ead_col)?;
    if let Some(lgd_col) = lgd_col {
        let lgd = loss_column(obs.frame, lgd_col)?;
        for (w, l) in weights.iter_mut().zip(&lgd) {
            *w *= l;
        }
    }
    Ok(weights)
}
