//! `risk-sampler` library crate.
//!
//! Sample weights for credit-risk (PD) modelling tables:
//!
//! - `strategies`: six independent reweighting rules (class balance, vintage
//!   balance, event-rate targeting, recency decay, expected loss, bootstrap)
//! - `weighting`: ordered multiplicative combination, then mean-1 normalization
//!   with an optional cap
//! - `sampler`: the `RiskSampler` facade tying both together
//! - `report` and `builders`: audit of a weight vector, and upstream panel
//!   transformations that produce the weighting input
//!
//! ```no_run
//! use risk_sampler::{Column, Frame, RiskSampler};
//!
//! let frame = Frame::new()
//!     .with_column("vint", Column::Int(vec![202401, 202401, 202402, 202402]))?
//!     .with_column("bad", Column::Int(vec![1, 0, 1, 0]))?;
//! let sampler = RiskSampler::from_json(
//!     r#"{"date_col": "vint", "target_col": "bad", "strategies": {"balanced": {}}}"#,
//! )?;
//! let weights = sampler.fit_transform(&frame)?;
//! assert_eq!(weights, vec![1.0; 4]);
//! # Ok::<(), risk_sampler::WeightError>(())
//! ```

pub mod builders;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
pub mod sampler;
pub mod strategies;
pub mod weighting;

pub use domain::{Cap, Column, DEFAULT_CAP, Frame, SamplerConfig, Vintage};
pub use error::{ErrorKind, Result, WeightError};
pub use report::AuditReport;
pub use sampler::{RiskSampler, WeightRun};
pub use strategies::Strategy;
