//! Live data feeds for late-bound scenario parameters.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Data feed failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// A scenario has bindings but the engine has no feed.
    #[error("No data feed configured; cannot resolve binding for '{0}'")]
    NotConfigured(String),

    /// The feed does not know the source.
    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    /// The feed could not be reached.
    #[error("Data source '{source_name}' unavailable: {reason}")]
    Unavailable {
        /// Source identifier.
        source_name: String,
        /// Reason reported by the feed.
        reason: String,
    },

    /// The feed returned NaN or an infinity.
    #[error("Data source '{source_name}' returned non-finite value {value}")]
    NonFinite {
        /// Source identifier.
        source_name: String,
        /// Returned value.
        value: f64,
    },
}

/// Source of live parameter values.
///
/// Implementations must be shareable across the worker pool.
pub trait DataFeed: Send + Sync {
    /// Current value of `source`.
    fn fetch(&self, source: &str) -> Result<f64, FeedError>;
}

/// In-memory [`DataFeed`] with values set up front or updated later.
#[derive(Debug, Default)]
pub struct StaticDataFeed {
    values: RwLock<HashMap<String, f64>>,
}

impl StaticDataFeed {
    /// Empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with_value(self, source: impl Into<String>, value: f64) -> Self {
        self.set(source, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn set(&self, source: impl Into<String>, value: f64) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.into(), value);
    }
}

impl DataFeed for StaticDataFeed {
    fn fetch(&self, source: &str) -> Result<f64, FeedError> {
        let value = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .copied()
            .ok_or_else(|| FeedError::UnknownSource(source.to_string()))?;

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FeedError::NonFinite {
                source_name: source.to_string(),
                value,
            })
        }
    }
}
