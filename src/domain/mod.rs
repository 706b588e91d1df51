//! Domain types used throughout the weighting pipeline.
//!
//! This module defines:
//!
//! - the input table (`Frame`, `Column`, `CellKey`)
//! - monthly periods (`Vintage`)
//! - configuration records (`SamplerConfig`, `Cap`)

pub mod frame;
pub mod types;

pub use frame::*;
pub use types::*;
