//! The weighting engine: plan resolution, combination and normalization.

pub mod combine;
pub mod normalize;
pub mod plan;

pub use combine::{Combined, StepSummary, combine};
pub use normalize::{NormalizationSummary, Normalized, normalize};
pub use plan::ExecutionPlan;
