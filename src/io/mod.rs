//! Input boundary.
//!
//! - frame validation + per-row vintage/target extraction (`ingest`)

pub mod ingest;

pub use ingest::*;
