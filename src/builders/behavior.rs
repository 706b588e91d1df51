//! Behavior-PD population: performing months grouped into spells.
//!
//! Per id, in period order:
//! - only performing months (default flag `0`) are kept
//! - each run of performing months is a spell, numbered from 1
//! - a run that starts right after a default is only accepted once it has
//!   lasted `cure_gap` months; its earlier months are dropped
//! - `censored` is 1 when none of the spell's kept rows is in default, which
//!   holds for every kept row since only performing months are kept
//! - `ends_in_default` is 1 when a default month ends the spell and 0 when the
//!   spell reaches the end of the id's history

use std::collections::BTreeSet;

use crate::builders::{FrameBuilder, numeric, panel_order};
use crate::domain::{Column, Frame};
use crate::error::Result;
use crate::io::parse_vintages;

pub const DEFAULT_CURE_GAP: usize = 3;

#[derive(Debug, Clone)]
pub struct BehaviorPdBuilder {
    id_col: String,
    ref_col: String,
    default_col: String,
    target_col: Option<String>,
    cure_gap: usize,
}

struct KeptRow {
    row: usize,
    spell_id: String,
    months_elapsed: i64,
    ends_in_default: bool,
}

impl BehaviorPdBuilder {
    pub fn new(id_col: impl Into<String>, ref_col: impl Into<String>, default_col: impl Into<String>) -> Self {
        Self {
            id_col: id_col.into(),
            ref_col: ref_col.into(),
            default_col: default_col.into(),
            target_col: None,
            cure_gap: DEFAULT_CURE_GAP,
        }
    }

    pub fn target_col(mut self, name: impl Into<String>) -> Self {
        self.target_col = Some(name.into());
        self
    }

    /// `0` disables the cure rule.
    pub fn cure_gap(mut self, months: usize) -> Self {
        self.cure_gap = months;
        self
    }

    fn spells(&self, id: &str, rows: &[usize], performing: &[bool], out: &mut Vec<KeptRow>) {
        let n = rows.len();
        let mut spell_no = 0;
        let mut i = 0;
        while i < n {
            if !performing[rows[i]] {
                i += 1;
                continue;
            }
            let mut j = i;
            while j < n && performing[rows[j]] {
                j += 1;
            }
            spell_no += 1;

            let skip = if self.cure_gap > 0 && i > 0 {
                (self.cure_gap - 1).min(j - i)
            } else {
                0
            };
            let ends_in_default = j < n;
            for (elapsed, &row) in rows[i + skip..j].iter().enumerate() {
                out.push(KeptRow {
                    row,
                    spell_id: format!("{id}_{spell_no}"),
                    months_elapsed: elapsed as i64,
                    ends_in_default,
                });
            }
            i = j;
        }
    }
}

impl FrameBuilder for BehaviorPdBuilder {
    fn transform(&self, frame: &Frame) -> Result<Frame> {
        let periods = parse_vintages(frame.require(&self.ref_col)?, &self.ref_col)?;
        let ids = frame.require(&self.id_col)?;
        let defaults = numeric(frame, &self.default_col)?;
        let performing: Vec<bool> = defaults.iter().map(|&d| d == 0.0).collect();
        if let Some(target) = &self.target_col {
            frame.require(target)?;
        }

        let (order, blocks) = panel_order(ids, &periods);
        let mut kept = Vec::new();
        for (start, end) in blocks {
            let block = &order[start..end];
            let id = ids.key(block[0]).to_string();
            self.spells(&id, block, &performing, &mut kept);
        }

        let rows: Vec<usize> = kept.iter().map(|k| k.row).collect();
        let mut out = frame.take_rows(&rows);
        out.insert("spell_id", Column::Str(kept.iter().map(|k| k.spell_id.clone()).collect()))?;
        out.insert("months_elapsed", Column::Int(kept.iter().map(|k| k.months_elapsed).collect()))?;

        // Spells with any defaulted kept row are uncensored.
        let mut defaulted: BTreeSet<&str> = BTreeSet::new();
        for k in kept.iter().filter(|k| defaults[k.row] != 0.0) {
            defaulted.insert(k.spell_id.as_str());
        }
        let censored = kept
            .iter()
            .map(|k| i64::from(!defaulted.contains(k.spell_id.as_str())))
            .collect();
        out.insert("censored", Column::Int(censored))?;
        out.insert(
            "ends_in_default",
            Column::Int(kept.iter().map(|k| i64::from(k.ends_in_default)).collect()),
        )?;

        let mut front = vec![
            self.id_col.as_str(),
            "spell_id",
            self.ref_col.as_str(),
            "months_elapsed",
            "censored",
        ];
        front.extend(self.target_col.as_deref());
        Ok(out.reorder_columns(&front))
    }
}
