//! # sim_engine (L4: Simulation Engine)
//!
//! Runs Monte Carlo scenarios end to end: validation, sampling on a bounded
//! worker pool, analysis, result caching and an audit trail.
//!
//! This crate provides:
//! - [`SimulationEngine`], the entry point for every kind of run
//! - [`EngineConfig`] loaded from TOML with `SIM_ENGINE_*` overrides
//! - A two-tier result cache: in-process moka plus an optional shared tier
//!   ([`FileCache`] or any [`CacheBackend`])
//! - An in-memory [`AuditLog`] of start, complete and error events
//! - [`DataFeed`] bindings that replace distribution parameters with live
//!   values before sampling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             sim_engine (L4)             │
//! ├─────────────────────────────────────────┤
//! │  engine/       - run orchestration      │
//! │  sampling/     - chunked parallel draws │
//! │  time_series/  - trajectory projection  │
//! │  cache/        - local + shared tiers   │
//! │  audit/        - event trail            │
//! │  feed/         - live parameter values  │
//! │  config/       - TOML + env overrides   │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │              sim_risk (L3)              │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │             sim_models (L2)             │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │              sim_core (L1)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! With a fixed [`EngineConfig::seed`] a run is reproducible for a given
//! worker count: chunk `i` of a parallel run draws from
//! `derive_seed(seed, i)`, and a sequential run is the one-chunk case.
//!
//! ## Example
//!
//! ```
//! use sim_engine::{EngineConfig, SimulationEngine};
//! use sim_models::distributions::{Distribution, VariableDefinition};
//!
//! let engine = SimulationEngine::new(EngineConfig::default().with_seed(42)).unwrap();
//! let vars = [VariableDefinition::new(
//!     "loss",
//!     Distribution::Normal { mean: 100.0, std: 15.0 },
//! )];
//!
//! let result = engine.run_custom_simulation(&vars, None, Some(5_000)).unwrap();
//! let metrics = result.risk_metrics.unwrap();
//! let metrics = &metrics["variable_0"];
//! assert!(metrics.cvar_95 >= metrics.var_95);
//! ```

#![deny(missing_docs)]

pub mod audit;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod result;
pub mod sampling;
pub mod time_series;

pub use audit::{AuditEvent, AuditEventType, AuditLog, DataClassification};
pub use cache::{CacheBackend, CacheStatus, FileCache, LocalCache, ResultSettings, TieredCache};
pub use config::{ConfigError, EngineConfig};
pub use engine::SimulationEngine;
pub use error::{CacheError, SimulationError};
pub use feed::{DataFeed, FeedError, StaticDataFeed};
pub use result::{EngineStatus, HealthCheck, HealthReport, SimulationResult};
pub use time_series::{TimeSeriesProjection, Trajectory};
