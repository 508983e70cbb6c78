//! Shared helpers for sim_engine integration tests.

#![allow(dead_code)]

use sim_engine::{EngineConfig, SimulationEngine};
use sim_models::distributions::Distribution;
use sim_models::ScenarioConfig;
use tracing_subscriber::EnvFilter;

/// Routes engine logs through the test harness; set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Seeded configuration with a small pool.
pub fn seeded_config(seed: u64) -> EngineConfig {
    EngineConfig::default().with_seed(seed).with_max_workers(4)
}

/// Engine built from [`seeded_config`].
pub fn seeded_engine(seed: u64) -> SimulationEngine {
    init_tracing();
    SimulationEngine::new(seeded_config(seed)).unwrap()
}

/// Single normal variable `loss ~ N(100, 15)`.
pub fn normal_scenario() -> ScenarioConfig {
    ScenarioConfig::builder("single_normal")
        .variable("loss", Distribution::Normal { mean: 100.0, std: 15.0 })
        .build()
        .unwrap()
}
