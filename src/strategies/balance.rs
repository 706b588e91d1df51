//! Group-mass equalisation: class balance and vintage balance.
//!
//! Both strategies give every group the same total weight mass by weighting a
//! row with `(n / groups) / rows_in_its_group`.

use std::collections::BTreeMap;

use crate::domain::Vintage;
use crate::error::{Result, WeightError};
use crate::io::Observations;

/// `balanced`: equal total mass for bad and good rows.
pub fn class_balanced(obs: &Observations) -> Result<Vec<f64>> {
    let n = obs.len();
    let n_bad = obs.stats.n_bad;
    let n_good = n - n_bad;

    if n_bad == 0 || n_good == 0 {
        let empty = if n_bad == 0 { 1 } else { 0 };
        return Err(WeightError::degenerate(format!(
            "balanced: target class {empty} has no rows (bad={n_bad}, good={n_good})."
        )));
    }

    let half = n as f64 / 2.0;
    let w_bad = half / n_bad as f64;
    let w_good = half / n_good as f64;

    Ok(obs
        .targets
        .iter()
        .map(|&bad| if bad { w_bad } else { w_good })
        .collect())
}

/// `equal_vintage`: equal total mass for every distinct vintage.
pub fn vintage_balanced(obs: &Observations) -> Result<Vec<f64>> {
    let k = obs.by_vintage.len();
    if k == 0 {
        return Err(WeightError::degenerate("equal_vintage: table has no vintages."));
    }

    let share = obs.len() as f64 / k as f64;
    let mut factors: BTreeMap<Vintage, f64> = BTreeMap::new();
    for (&vintage, group) in &obs.by_vintage {
        if group.rows == 0 {
            return Err(WeightError::degenerate(format!(
                "equal_vintage: vintage {vintage} has no rows."
            )));
        }
        factors.insert(vintage, share / group.rows as f64);
    }

    Ok(obs.vintages.iter().map(|v| factors[v]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Frame};
    use crate::io::ingest;

    fn frame(vint: Vec<i64>, bad: Vec<i64>) -> Frame {
        Frame::new()
            .with_column("vint", Column::Int(vint))
            .unwrap()
            .with_column("bad", Column::Int(bad))
            .unwrap()
    }

    #[test]
    fn balanced_equalises_class_mass() {
        // 20% event rate: bads get 2.5, goods 0.625.
        let bad: Vec<i64> = (0..100).map(|i| i64::from(i < 20)).collect();
        let f = frame(vec![202401; 100], bad);
        let obs = ingest(&f, "vint", "bad").unwrap();
        let w = class_balanced(&obs).unwrap();

        assert!((w[0] - 2.5).abs() < 1e-12);
        assert!((w[99] - 0.625).abs() < 1e-12);
        let bad_mass: f64 = w.iter().zip(&obs.targets).filter(|(_, b)| **b).map(|(w, _)| w).sum();
        let good_mass: f64 = w.iter().zip(&obs.targets).filter(|(_, b)| !**b).map(|(w, _)| w).sum();
        assert!((bad_mass - good_mass).abs() < 1e-9);
    }

    #[test]
    fn balanced_fails_on_missing_class() {
        let f = frame(vec![202401, 202402], vec![0, 0]);
        let obs = ingest(&f, "vint", "bad").unwrap();
        let err = class_balanced(&obs).unwrap_err();
        assert!(matches!(err, WeightError::DegenerateGroup(_)));
        assert!(err.to_string().contains("class 1"));
    }

    #[test]
    fn equal_vintage_matches_known_factors() {
        // 70 rows in one vintage, 30 in the other: factors 50/70 and 50/30.
        let mut vint = vec![202401; 70];
        vint.extend(vec![202402; 30]);
        let f = frame(vint, vec![0; 100]);
        let obs = ingest(&f, "vint", "bad").unwrap();
        let w = vintage_balanced(&obs).unwrap();

        assert!((w[0] - 50.0 / 70.0).abs() < 1e-12);
        assert!((w[99] - 50.0 / 30.0).abs() < 1e-12);
        let first: f64 = w[..70].iter().sum();
        let second: f64 = w[70..].iter().sum();
        assert!((first - second).abs() < 1e-9);
    }

    #[test]
    fn equal_vintage_on_empty_table_is_degenerate() {
        let f = frame(vec![], vec![]);
        let obs = ingest(&f, "vint", "bad").unwrap();
        assert!(matches!(
            vintage_balanced(&obs).unwrap_err(),
            WeightError::DegenerateGroup(_)
        ));
    }
}
