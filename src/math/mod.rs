//! Mathematical utilities: descriptive statistics and seed derivation.

pub mod seed;
pub mod stats;

pub use seed::*;
pub use stats::*;
