//! Upstream table builders.
//!
//! Builders turn panel data into the row-level tables the sampler consumes.
//! They share nothing with the weighting engine beyond `Frame`.

pub mod behavior;
pub mod target;

use std::collections::BTreeMap;

use crate::domain::{CellKey, Column, Frame, Vintage};
use crate::error::{Result, WeightError};

pub use behavior::BehaviorPdBuilder;
pub use target::{Frequency, TargetBuilder, TargetRule, Window};

/// A table-to-table transformation.
pub trait FrameBuilder {
    fn transform(&self, frame: &Frame) -> Result<Frame>;
}

/// Row order sorted by `(id, period)`, plus the `[start, end)` bounds of each
/// id's block in that order.
pub(crate) fn panel_order(ids: &Column, periods: &[Vintage]) -> (Vec<usize>, Vec<(usize, usize)>) {
    let mut rows: Vec<usize> = (0..periods.len()).collect();
    rows.sort_by(|&a, &b| ids.key(a).cmp(&ids.key(b)).then(periods[a].cmp(&periods[b])));

    let mut blocks: BTreeMap<CellKey, (usize, usize)> = BTreeMap::new();
    for (pos, &row) in rows.iter().enumerate() {
        blocks
            .entry(ids.key(row))
            .and_modify(|b| b.1 = pos + 1)
            .or_insert((pos, pos + 1));
    }
    (rows, blocks.into_values().collect())
}

/// Whole numeric column, or a data error naming it.
pub(crate) fn numeric(frame: &Frame, name: &str) -> Result<Vec<f64>> {
    let column = frame.require(name)?;
    column.to_f64_vec().ok_or_else(|| {
        WeightError::data(format!(
            "Column '{name}' has type {} (expected numeric).",
            column.dtype()
        ))
    })
}
