//! Recency decay (`recency_decay`).
//!
//! A row's weight is `0.5^(age / half_life)` (or `exp(-lambda * age)`), where
//! `age` is the number of months between its vintage and the latest vintage in
//! the table. The latest vintage always gets weight 1.

use crate::io::Observations;

/// Decay speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayRate {
    /// Months for the weight to halve.
    HalfLife(f64),
    /// Continuous decay rate per month.
    Lambda(f64),
}

impl DecayRate {
    pub fn factor(self, age: f64) -> f64 {
        match self {
            DecayRate::HalfLife(h) => 0.5_f64.powf(age / h),
            DecayRate::Lambda(l) => (-l * age).exp(),
        }
    }
}

/// `recency_decay` raw weights. Infallible once the rate has been validated.
pub fn recency_weights(obs: &Observations, rate: DecayRate) -> Vec<f64> {
    let Some(latest) = obs.stats.last_vintage else {
        return Vec::new();
    };
    obs.vintages
        .iter()
        .map(|v| rate.factor(f64::from(v.months_until(latest))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Frame};
    use crate::io::ingest;

    #[test]
    fn latest_vintage_weighs_one_and_older_halve() {
        let f = Frame::new()
            .with_column("vint", Column::Int(vec![202401, 202312, 202402, 202402]))
            .unwrap()
            .with_column("bad", Column::Int(vec![0, 1, 0, 1]))
            .unwrap();
        let obs = ingest(&f, "vint", "bad").unwrap();
        let w = recency_weights(&obs, DecayRate::HalfLife(1.0));
        assert_eq!(w, vec![0.5, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn strictly_decreasing_in_age() {
        for rate in [DecayRate::HalfLife(6.0), DecayRate::Lambda(0.3)] {
            let mut prev = rate.factor(0.0);
            assert_eq!(prev, 1.0);
            for age in 1..48 {
                let w = rate.factor(age as f64);
                assert!(w < prev, "{rate:?} not decreasing at age {age}");
                prev = w;
            }
        }
    }

    #[test]
    fn lambda_matches_equivalent_half_life() {
        let h = 4.0;
        let a = DecayRate::HalfLife(h).factor(7.0);
        let b = DecayRate::Lambda(std::f64::consts::LN_2 / h).factor(7.0);
        assert!((a - b).abs() < 1e-12);
    }
}
