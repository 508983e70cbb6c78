//! Engine error types.

use sim_core::CoreError;
use sim_models::{CorrelationError, DistributionError, ScenarioError};
use sim_risk::AnalysisError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FeedError;

/// Errors returned by the `run_*` entry points.
///
/// Cache failures never appear here: they are logged and swallowed.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Scenario failed validation.
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Distribution parameters out of domain.
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    /// Correlation matrix or copula problem.
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Sample container rejected the data.
    #[error("Sample error: {0}")]
    Samples(#[from] CoreError),

    /// Result analysis failed.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// A data binding could not be resolved.
    #[error("Data feed error: {0}")]
    DataFeed(#[from] FeedError),

    /// A sampling chunk failed on the worker pool.
    #[error("Worker chunk {chunk} failed: {reason}")]
    WorkerPool {
        /// Index of the failing chunk.
        chunk: usize,
        /// Underlying error message.
        reason: String,
    },

    /// The worker pool could not be built.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// The engine has been shut down.
    #[error("Simulation engine has been shut down")]
    EngineShutdown,

    /// Engine configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result (de)serialisation failed.
    #[error("Serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Iteration count outside `1..=max_iterations`.
    #[error("Iterations must be between 1 and {max}, got {requested}")]
    InvalidIterations {
        /// Requested count.
        requested: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Cache tier failures.
///
/// Always recovered from inside the engine; exposed for backend
/// implementors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// Backend cannot be reached.
    #[error("Cache backend '{backend}' unavailable: {reason}")]
    Unavailable {
        /// Backend name.
        backend: String,
        /// Reason reported by the backend.
        reason: String,
    },

    /// Filesystem failure.
    #[error("Cache I/O error: {0}")]
    Io(String),

    /// Stored entry could not be decoded or encoded.
    #[error("Cache entry is corrupt: {0}")]
    Corrupt(String),

    /// Backend call did not answer in time.
    #[error("Cache {operation} timed out after {millis} ms")]
    Timeout {
        /// `ping`, `read` or `write`.
        operation: &'static str,
        /// Bound that was exceeded.
        millis: u64,
    },
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SimulationError::InvalidIterations { requested: 0, max: 10 }.to_string(),
            "Iterations must be between 1 and 10, got 0"
        );
        assert_eq!(
            SimulationError::EngineShutdown.to_string(),
            "Simulation engine has been shut down"
        );
        assert_eq!(
            CacheError::Timeout {
                operation: "ping",
                millis: 250
            }
            .to_string(),
            "Cache ping timed out after 250 ms"
        );
    }

    #[test]
    fn test_from_conversions() {
        let err: SimulationError = ScenarioError::UnknownScenarioTemplate("x".to_string()).into();
        assert!(matches!(err, SimulationError::Scenario(_)));
        let err: SimulationError = AnalysisError::EmptySamples.into();
        assert!(matches!(err, SimulationError::Analysis(_)));
    }
}
