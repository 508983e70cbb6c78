//! Analysis error types.

use thiserror::Error;

/// Errors raised by the Result Analyzer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// No samples to analyse.
    #[error("Cannot analyse an empty sample matrix")]
    EmptySamples,

    /// Confidence level outside `(0, 1)`.
    #[error("Confidence level must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    /// Failure thresholds were given but not one per column.
    #[error("Expected {expected} failure thresholds (one per variable), got {got}")]
    ThresholdCount {
        /// Number of columns.
        expected: usize,
        /// Number of thresholds supplied.
        got: usize,
    },

    /// A stress configuration factor is not usable.
    #[error("Invalid stress test configuration: {0}")]
    InvalidStressConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AnalysisError::InvalidConfidence(1.5).to_string(),
            "Confidence level must lie strictly between 0 and 1, got 1.5"
        );
        assert_eq!(
            AnalysisError::ThresholdCount { expected: 3, got: 1 }.to_string(),
            "Expected 3 failure thresholds (one per variable), got 1"
        );
    }
}
