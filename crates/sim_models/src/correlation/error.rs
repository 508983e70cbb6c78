//! Correlation error types.

use sim_core::CoreError;
use thiserror::Error;

use crate::distributions::DistributionError;

/// Error types for correlation operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// A row does not have as many entries as there are rows
    #[error("Correlation matrix is not square: row {row} has {got} entries, expected {expected}")]
    NotSquare {
        /// Offending row
        row: usize,
        /// Expected row length
        expected: usize,
        /// Actual row length
        got: usize,
    },

    /// Diagonal elements are not 1.0
    #[error("Diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Diagonal index
        index: usize,
        /// Actual value
        value: f64,
    },

    /// Matrix is not symmetric
    #[error("Matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row
        i: usize,
        /// Column
        j: usize,
    },

    /// Correlation value out of range [-1, 1]
    #[error("Correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row
        i: usize,
        /// Column
        j: usize,
        /// Actual value
        value: f64,
    },

    /// Cholesky factorisation hit a negative pivot or a non-zero residual
    /// below a zero pivot
    #[error("Correlation matrix is not positive semi-definite (pivot {pivot})")]
    NotPositiveSemiDefinite {
        /// Column at which factorisation failed
        pivot: usize,
    },

    /// Too few observations for the requested statistic
    #[error("Insufficient data: need at least {required} observations, got {got}")]
    InsufficientData {
        /// Minimum observations
        required: usize,
        /// Observations supplied
        got: usize,
    },

    /// A generation or test parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Matrix dimension disagrees with the number of variables
    #[error("Dimension mismatch: matrix is {expected}x{expected}, got {got} variables")]
    DimensionMismatch {
        /// Matrix dimension
        expected: usize,
        /// Number of variables
        got: usize,
    },

    /// A marginal could not be sampled
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// The sample matrix could not be assembled
    #[error(transparent)]
    Samples(#[from] CoreError),
}
