//! Simulation result and engine status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sim_core::{SampleMatrix, SampleSummary};
use sim_models::scenarios::{FeatureFlags, ScenarioConfig};
use sim_risk::failure_modes::FailureModes;
use sim_risk::{
    RiskPrioritization, SensitivityReport, StressTestReport, SummaryReport, VariableRiskMetrics,
    VariableStatistics,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::audit::DataClassification;
use crate::cache::CacheStatus;
use crate::time_series::TimeSeriesProjection;

/// Outcome of one simulation run.
///
/// Analysis blocks are keyed by positional column name (`variable_0`,
/// `variable_1`, ...); `variable_names` maps positions back to the
/// scenario's declared names. Blocks switched off by the scenario's
/// feature flags are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Unique run identifier
    pub simulation_id: Uuid,
    /// When sampling started
    pub start_time: DateTime<Utc>,
    /// When the result was assembled
    pub end_time: DateTime<Utc>,
    /// Number of sampled rows
    pub iterations: usize,
    /// Scenario as run, after data bindings were resolved
    pub scenario: ScenarioConfig,
    /// Descriptive statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BTreeMap<String, VariableStatistics>>,
    /// VaR, CVaR and failure probabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_metrics: Option<BTreeMap<String, VariableRiskMetrics>>,
    /// Severity levels and trend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_analysis: Option<BTreeMap<String, FailureModes>>,
    /// Composite scores and priority buckets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_prioritization: Option<RiskPrioritization>,
    /// Stress test outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_testing: Option<StressTestReport>,
    /// Sensitivity against the aggregate output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityReport>,
    /// Executive summary
    pub summary: SummaryReport,
    /// Declared variable names in column order
    pub variable_names: Vec<String>,
    /// Shape and range of the sample
    pub sample_summary: SampleSummary,
    /// Raw samples, when the engine is configured to keep them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_samples: Option<SampleMatrix>,
    /// Time-series projection, for scenarios that request one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeriesProjection>,
    /// Feature flags the run honoured
    pub features: FeatureFlags,
    /// Whether sampling ran on the worker pool
    pub parallel: bool,
    /// Base seed of the run
    pub seed: u64,
    /// Set on results served from the cache
    #[serde(default)]
    pub cached: bool,
}

impl SimulationResult {
    /// Positional column name of declared variable `name`.
    pub fn column_of(&self, name: &str) -> Option<String> {
        self.variable_names
            .iter()
            .position(|n| n == name)
            .map(sim_core::types::samples::default_column_name)
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Snapshot of engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Crate version
    pub version: String,
    /// Threads in the worker pool
    pub worker_count: usize,
    /// Configured worker ceiling
    pub max_workers: usize,
    /// Iterations above which runs go parallel
    pub parallel_threshold: usize,
    /// Iterations used when none are requested
    pub default_iterations: usize,
    /// Cache counters
    pub cache: CacheStatus,
    /// Retained audit events
    pub audit_events: usize,
    /// Audit events dropped by the retention limit
    pub audit_events_evicted: u64,
    /// Classification stamped on audit events
    pub data_classification: DataClassification,
    /// Supported distribution names
    pub supported_distributions: Vec<String>,
    /// Available scenario template names
    pub scenario_templates: Vec<String>,
    /// Whether [`shutdown`](crate::SimulationEngine::shutdown) was called
    pub shut_down: bool,
}

/// One self-test step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Step name
    pub name: String,
    /// Whether the step succeeded
    pub passed: bool,
    /// What was observed
    pub detail: String,
}

/// Outcome of [`validate_configuration`](crate::SimulationEngine::validate_configuration).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Every step, in execution order
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    /// Whether every step passed.
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &HealthCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
