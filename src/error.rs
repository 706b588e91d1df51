//! Error type shared by every weighting stage.
//!
//! Errors are raised synchronously where they are detected and never retried:
//! weighting is a pure function of configuration and data, so the caller has to
//! fix one of them.

use thiserror::Error;

/// Coarse error classification, for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
    DegenerateGroup,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// Invalid or missing parameters (unknown strategy, ambiguous combo, out-of-range values).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structural problems in the input table.
    #[error("Data error: {0}")]
    Data(String),

    /// A grouping required by a strategy (or the normalizer) has no support.
    #[error("Degenerate group: {0}")]
    DegenerateGroup(String),
}

impl WeightError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGroup(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeightError::Configuration(_) => ErrorKind::Configuration,
            WeightError::Data(_) => ErrorKind::Data,
            WeightError::DegenerateGroup(_) => ErrorKind::DegenerateGroup,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WeightError::Configuration(m) | WeightError::Data(m) | WeightError::DegenerateGroup(m) => m,
        }
    }
}

pub type Result<T> = std::result::Result<T, WeightError>;
