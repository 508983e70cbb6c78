//! Scenario error types.

use thiserror::Error;

use crate::correlation::CorrelationError;
use crate::distributions::DistributionError;

/// Errors from scenario construction and validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// The configuration is malformed
    #[error("Scenario validation failed: {0}")]
    Validation(String),

    /// The template name is not registered
    #[error("Unknown scenario template: {0}")]
    UnknownScenarioTemplate(String),

    /// An override or binding names a variable the scenario does not declare
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// A distribution parameter is out of domain
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// The correlation matrix or copula is invalid
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
}

impl ScenarioError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}
