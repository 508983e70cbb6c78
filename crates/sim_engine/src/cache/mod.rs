//! Two-tier result cache.
//!
//! Entries are JSON-serialised results keyed by a blake3 digest of the
//! canonical JSON of the scenario, the iteration count and the engine
//! settings that shape a result. The shared tier is pinged once at
//! construction; if the ping fails or is slow the cache runs local-only for
//! the rest of its life. Later shared reads and writes are bounded by the
//! same timeout and count as misses when they overrun.

mod file;
mod local;
mod tiered;

pub use file::FileCache;
pub use local::LocalCache;
pub use tiered::{CacheStatus, TieredCache};

use serde::Serialize;
use sim_models::ScenarioConfig;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::CacheError;

/// Storage capability of one cache tier.
pub trait CacheBackend: Send + Sync {
    /// Short name for logs and status.
    fn name(&self) -> &str;

    /// Cheap health check.
    fn ping(&self) -> Result<(), CacheError>;

    /// Value stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Engine settings that change the content of a result.
///
/// Engines that differ in any of these must never share cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultSettings {
    /// Level of `var_at_confidence` / `cvar_at_confidence`
    pub confidence_level: f64,
    /// Whether results carry the raw sample matrix
    pub include_raw_samples: bool,
    /// Base seed of the run
    pub seed: Option<u64>,
    /// Seed of the correlation-breakdown permutation
    pub stress_seed: Option<u64>,
}

impl From<&EngineConfig> for ResultSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            confidence_level: config.confidence_level,
            include_raw_samples: config.include_raw_samples,
            seed: config.seed,
            stress_seed: config.stress_seed,
        }
    }
}

#[derive(Serialize)]
struct CacheKeyInput<'a> {
    scenario: &'a ScenarioConfig,
    iterations: usize,
    settings: &'a ResultSettings,
}

/// Hex blake3 digest identifying a run.
///
/// Scenario maps are ordered, so equal configurations always serialise to
/// the same bytes.
pub fn cache_key(
    scenario: &ScenarioConfig,
    iterations: usize,
    settings: &ResultSettings,
) -> Result<String, CacheError> {
    let bytes = serde_json::to_vec(&CacheKeyInput {
        scenario,
        iterations,
        settings,
    })
    .map_err(|e| CacheError::Corrupt(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
