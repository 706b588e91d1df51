//! Event-rate stabilisation (`stabilise_er`).
//!
//! Within each vintage with observed bad rate `p`, bad rows are scaled by
//! `t / p` and good rows by `(1 - t) / (1 - p)`, so the weighted bad rate of
//! that vintage becomes exactly `t`.

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::Vintage;
use crate::error::{Result, WeightError};
use crate::io::Observations;

/// Per-vintage multipliers `(bad, good)`.
fn multipliers(obs: &Observations, target_er: f64) -> BTreeMap<Vintage, (f64, f64)> {
    obs.by_vintage
        .iter()
        .map(|(&vintage, group)| {
            if group.bad == 0 || group.bad == group.rows {
                // No variance to stabilise: leave the vintage untouched.
                warn!(
                    %vintage,
                    rows = group.rows,
                    bad = group.bad,
                    "stabilise_er: vintage has a single target class; passing through"
                );
                return (vintage, (1.0, 1.0));
            }
            let p = group.event_rate();
            let bad = (target_er / p).max(0.0);
            let good = ((1.0 - target_er) / (1.0 - p)).max(0.0);
            (vintage, (bad, good))
        })
        .collect()
}

/// `stabilise_er` raw weights.
///
/// `target_er = None` targets the table's global event rate. A given target
/// is checked to lie strictly in (0, 1) when the strategy is looked up; the
/// global rate reaches 0 or 1 only when every vintage is single-class, and
/// those vintages pass through.
pub fn stabilise_event_rate(obs: &Observations, target_er: Option<f64>) -> Result<Vec<f64>> {
    let target = target_er.unwrap_or_else(|| obs.stats.global_event_rate());
    let table = multipliers(obs, target);
    let mut out = Vec::with_capacity(obs.len());
    for (vintage, &bad) in obs.vintages.iter().zip(&obs.targets) {
        let (m_bad, m_good) = table[vintage];
        let m = if bad { m_bad } else { m_good };
        if !m.is_finite() {
            return Err(WeightError::degenerate(format!(
                "stabilise_er: non-finite multiplier for vintage {vintage}."
            )));
        }
        out.push(m);
    }
    Ok(out)
}
