//! Error types for structured error handling.
//!
//! This module provides:
//! - `CoreError`: Errors from constructing or combining sample matrices

use thiserror::Error;

/// Structural errors for sample containers.
///
/// # Examples
/// ```
/// use sim_core::CoreError;
///
/// let err = CoreError::DimensionMismatch { expected: 3, got: 2 };
/// assert_eq!(format!("{}", err), "Dimension mismatch: expected 3, got 2");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Columns, names or chunks disagree on their dimensions.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// A sample value is NaN or infinite.
    #[error("Non-finite value {value} in column {column} at row {row}")]
    NonFiniteValue {
        /// Column index
        column: usize,
        /// Row index
        row: usize,
        /// Offending value
        value: f64,
    },

    /// No rows or no columns were supplied.
    #[error("Sample matrix must contain at least one row and one column")]
    EmptySamples,

    /// Two columns share the same name.
    #[error("Duplicate column name: {0}")]
    DuplicateName(String),
}
