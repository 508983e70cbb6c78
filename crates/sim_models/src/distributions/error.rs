//! Distribution error types.

use thiserror::Error;

use super::DistributionKind;

/// Errors from the Distribution Library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// A parameter lies outside its valid domain.
    #[error("Invalid parameter '{parameter}' for {kind} distribution: {reason}")]
    InvalidParameter {
        /// Distribution kind
        kind: DistributionKind,
        /// Parameter name
        parameter: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The distribution name is not registered.
    #[error("Unknown distribution: {0}")]
    UnknownDistribution(String),

    /// The parameter name does not belong to the distribution.
    #[error("Unknown parameter '{parameter}' for {kind} distribution")]
    UnknownParameter {
        /// Distribution kind
        kind: DistributionKind,
        /// Parameter name
        parameter: String,
    },
}

impl DistributionError {
    pub(crate) fn invalid(kind: DistributionKind, parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            kind,
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}
