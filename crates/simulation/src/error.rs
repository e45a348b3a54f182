//! Error types for the simulation engine boundary.
//!
//! Everything after successful construction is total: numeric edge cases
//! flow through the pipeline as non-finite values and are coerced to zero
//! before compounding rather than surfaced as errors.

use coinfolio_core::TableError;
use thiserror::Error;

/// Errors raised when constructing a simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The portfolio data is not usable as a price table.
    #[error("invalid portfolio data: {0}")]
    InvalidInput(String),

    /// Supplied weights do not sum to one within tolerance.
    #[error("sum of portfolio weights must equal one, got {sum:.4}")]
    InvalidWeights {
        /// The offending sum.
        sum: f64,
    },

    /// Weight vector length differs from the table's asset count.
    #[error("expected {expected} weights (one per asset), got {got}")]
    WeightCountMismatch {
        /// Number of assets in the table.
        expected: usize,
        /// Number of weights supplied.
        got: usize,
    },
}

impl SimulationError {
    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<TableError> for SimulationError {
    fn from(err: TableError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
