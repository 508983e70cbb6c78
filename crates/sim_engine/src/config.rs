//! Engine configuration.
//!
//! Loaded from a TOML file with `SIM_ENGINE_*` environment variable
//! overrides, or built programmatically with the `with_*` setters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::audit::DataClassification;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "SIM_ENGINE_";

/// Hard ceiling on `max_workers`.
pub const MAX_WORKERS_LIMIT: usize = 1024;

/// Configuration error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(String),
    /// One or more validation problems
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Simulation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on worker threads (the pool also never exceeds the CPU count)
    pub max_workers: usize,
    /// Runs with more iterations than this are split across the pool
    pub parallel_threshold: usize,
    /// Iterations used when a run does not specify any
    pub default_iterations: usize,
    /// Largest accepted iteration count
    pub max_iterations: usize,
    /// Base seed; fresh entropy per run when `None`
    pub seed: Option<u64>,
    /// Result cache time-to-live in seconds
    pub cache_ttl_secs: u64,
    /// Entry capacity of the in-process cache tier
    pub local_cache_capacity: u64,
    /// Directory of the shared file cache tier; local-only when `None`
    pub shared_cache_dir: Option<PathBuf>,
    /// Bound in milliseconds on every shared cache tier call, the start-up
    /// ping included
    pub probe_timeout_ms: u64,
    /// Classification stamped on audit events
    pub data_classification: DataClassification,
    /// Confidence level of `var_at_confidence` / `cvar_at_confidence`
    pub confidence_level: f64,
    /// Whether results carry the raw sample matrix
    pub include_raw_samples: bool,
    /// Seed of the correlation-breakdown stress permutation; derived from
    /// the run seed when `None`
    pub stress_seed: Option<u64>,
    /// Audit events retained before the oldest are dropped
    pub max_audit_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            parallel_threshold: 10_000,
            default_iterations: 10_000,
            max_iterations: 10_000_000,
            seed: None,
            cache_ttl_secs: 3600,
            local_cache_capacity: 256,
            shared_cache_dir: None,
            probe_timeout_ms: 250,
            data_classification: DataClassification::Internal,
            confidence_level: 0.95,
            include_raw_samples: true,
            stress_seed: None,
            max_audit_events: 100_000,
        }
    }
}

/// Reads and parses `SIM_ENGINE_<name>`; unparsable values are ignored.
fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let key = format!("{}{}", ENV_PREFIX, name);
    let raw = std::env::var(&key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = %key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    ///
    /// Every field can be overridden by `SIM_ENGINE_<FIELD>` in upper case,
    /// e.g. `SIM_ENGINE_MAX_WORKERS=4`. Setting `SIM_ENGINE_SEED` or
    /// `SIM_ENGINE_SHARED_CACHE_DIR` to an empty string clears it.
    pub fn with_env_override(mut self) -> Self {
        if let Some(v) = env_value("MAX_WORKERS") {
            self.max_workers = v;
        }
        if let Some(v) = env_value("PARALLEL_THRESHOLD") {
            self.parallel_threshold = v;
        }
        if let Some(v) = env_value("DEFAULT_ITERATIONS") {
            self.default_iterations = v;
        }
        if let Some(v) = env_value("MAX_ITERATIONS") {
            self.max_iterations = v;
        }
        if let Ok(seed) = std::env::var(format!("{}SEED", ENV_PREFIX)) {
            self.seed = if seed.trim().is_empty() {
                None
            } else {
                env_value("SEED").or(self.seed)
            };
        }
        if let Some(v) = env_value("CACHE_TTL_SECS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_value("LOCAL_CACHE_CAPACITY") {
            self.local_cache_capacity = v;
        }
        if let Ok(dir) = std::env::var(format!("{}SHARED_CACHE_DIR", ENV_PREFIX)) {
            self.shared_cache_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(v) = env_value("PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = v;
        }
        if let Some(v) = env_value("DATA_CLASSIFICATION") {
            self.data_classification = v;
        }
        if let Some(v) = env_value("CONFIDENCE_LEVEL") {
            self.confidence_level = v;
        }
        if let Some(v) = env_value("INCLUDE_RAW_SAMPLES") {
            self.include_raw_samples = v;
        }
        if let Some(v) = env_value::<u64>("STRESS_SEED") {
            self.stress_seed = Some(v);
        }
        if let Some(v) = env_value("MAX_AUDIT_EVENTS") {
            self.max_audit_events = v;
        }

        self
    }

    /// Validate the configuration, collecting every problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.max_workers == 0 {
            errors.push("max_workers must be greater than 0".to_string());
        }
        if self.max_workers > MAX_WORKERS_LIMIT {
            errors.push(format!(
                "max_workers {} exceeds maximum allowed ({})",
                self.max_workers, MAX_WORKERS_LIMIT
            ));
        }
        if self.max_iterations == 0 {
            errors.push("max_iterations must be greater than 0".to_string());
        }
        if self.default_iterations == 0 {
            errors.push("default_iterations must be greater than 0".to_string());
        }
        if self.default_iterations > self.max_iterations {
            errors.push(format!(
                "default_iterations {} exceeds max_iterations {}",
                self.default_iterations, self.max_iterations
            ));
        }
        if self.cache_ttl_secs == 0 {
            errors.push("cache_ttl_secs must be greater than 0".to_string());
        }
        if self.local_cache_capacity == 0 {
            errors.push("local_cache_capacity must be greater than 0".to_string());
        }
        if self.probe_timeout_ms == 0 {
            errors.push("probe_timeout_ms must be greater than 0".to_string());
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            errors.push(format!(
                "confidence_level {} must lie strictly between 0 and 1",
                self.confidence_level
            ));
        }
        if let Some(dir) = &self.shared_cache_dir {
            if dir.as_os_str().is_empty() {
                errors.push("shared_cache_dir cannot be empty".to_string());
            }
        }
        if self.max_audit_events == 0 {
            errors.push("max_audit_events must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from file with environment overrides and validate
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Worker threads the engine will actually start.
    pub fn effective_workers(&self) -> usize {
        self.max_workers.min(num_cpus::get()).max(1)
    }

    /// Set the worker ceiling.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the parallel threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the default iteration count.
    pub fn with_default_iterations(mut self, iterations: usize) -> Self {
        self.default_iterations = iterations;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the cache TTL in seconds.
    pub fn with_cache_ttl_secs(mut self, ttl: u64) -> Self {
        self.cache_ttl_secs = ttl;
        self
    }

    /// Enable the shared file cache tier in `dir`.
    pub fn with_shared_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_cache_dir = Some(dir.into());
        self
    }

    /// Set the audit classification.
    pub fn with_data_classification(mut self, classification: DataClassification) -> Self {
        self.data_classification = classification;
        self
    }

    /// Set whether results carry raw samples.
    pub fn with_raw_samples(mut self, include: bool) -> Self {
        self.include_raw_samples = include;
        self
    }

    /// Set the stress permutation seed.
    pub fn with_stress_seed(mut self, seed: u64) -> Self {
        self.stress_seed = Some(seed);
        self
    }

    /// Set the confidence level of the configurable VaR/CVaR pair.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the audit retention limit.
    pub fn with_max_audit_events(mut self, max: usize) -> Self {
        self.max_audit_events = max;
        self
    }
}
