//! Unified error types for the alertsim ecosystem.
//!
//! This module provides a common error type [`SimError`] that can represent
//! errors from any part of the simulator. Domain-specific failures are
//! converted to `SimError` for uniform handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use alertsim_core::{SimError, SimResult};
//!
//! fn run(seed: &str) -> SimResult<()> {
//!     if seed.is_empty() {
//!         return Err(SimError::Config("seed cannot be empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all simulator operations.
///
/// Configuration errors fail fast at run construction, invariant
/// violations abort the run, and numeric-range errors flag non-finite
/// values that escaped the defensive clipping.
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid run or batch options (negative cache size, empty seed,
    /// unknown scenario/policy name, replicates < 1)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal postcondition failure; these are bugs
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// NaN/Inf observed in metrics, weights, or predictions
    #[error("Numeric out of range: {0}")]
    Numeric(String),

    /// I/O errors (file access, export sinks)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SimError.
pub type SimResult<T> = Result<T, SimError>;

impl From<anyhow::Error> for SimError {
    fn from(err: anyhow::Error) -> Self {
        SimError::Other(err.to_string())
    }
}

impl From<String> for SimError {
    fn from(s: String) -> Self {
        SimError::Other(s)
    }
}

impl From<&str> for SimError {
    fn from(s: &str) -> Self {
        SimError::Other(s.to_string())
    }
}
