//! Weighting strategies.
//!
//! Every strategy maps validated observations to one non-negative raw weight
//! per row. Strategies never normalise; scale is fixed once, after combination.

pub mod balance;
pub mod bootstrap;
pub mod decay;
pub mod event_rate;
pub mod loss;
pub mod registry;

use tracing::debug;

use crate::error::Result;
use crate::io::Observations;

pub use decay::DecayRate;
pub use registry::{COMBO, STRATEGY_NAMES, lookup};

/// A configured strategy with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Balanced,
    EqualVintage,
    StabiliseEr { target_er: Option<f64> },
    RecencyDecay(DecayRate),
    ExpectedLoss { ead_col: String, lgd_col: Option<String> },
    StratifiedBootstrap { random_state: Option<u64> },
}

impl Strategy {
    /// Registered name, as used in configuration keys and combo orders.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Balanced => "balanced",
            Strategy::EqualVintage => "equal_vintage",
            Strategy::StabiliseEr { .. } => "stabilise_er",
            Strategy::RecencyDecay(_) => "recency_decay",
            Strategy::ExpectedLoss { .. } => "expected_loss",
            Strategy::StratifiedBootstrap { .. } => "stratified_bootstrap",
        }
    }

    /// Columns this strategy reads beyond the date and target columns.
    pub fn required_columns(&self) -> Vec<&str> {
        match self {
            Strategy::ExpectedLoss { ead_col, lgd_col } => {
                let mut cols = vec![ead_col.as_str()];
                cols.extend(lgd_col.as_deref());
                cols
            }
            _ => Vec::new(),
        }
    }

    /// Raw (un-normalised) weights, one per observation.
    pub fn raw_weights(&self, obs: &Observations) -> Result<Vec<f64>> {
        match self {
            Strategy::Balanced => balance::class_balanced(obs),
            Strategy::EqualVintage => balance::vintage_balanced(obs),
            Strategy::StabiliseEr { target_er } => event_rate::stabilise_event_rate(obs, *target_er),
            Strategy::RecencyDecay(rate) => Ok(decay::recency_weights(obs, *rate)),
            Strategy::ExpectedLoss { ead_col, lgd_col } => {
                loss::expected_loss(obs, ead_col, lgd_col.as_deref())
            }
            Strategy::StratifiedBootstrap { random_state } => {
                let seed = random_state.unwrap_or_else(|| {
                    let seed = rand::random();
                    debug!(seed, "stratified_bootstrap: no random_state, using entropy seed");
                    seed
                });
                Ok(bootstrap::bootstrap_counts(obs, seed))
            }
        }
    }
}
