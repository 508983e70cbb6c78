//! End-to-end tests for the simulation engine.
//!
//! # Test Coverage
//!
//! - Statistical accuracy of a full run
//! - Sequential and parallel sampling equivalence and reproducibility
//! - Result caching: local hits, shared directory tier, expiry, failed runs,
//!   settings isolation and stalled shared backends
//! - Data feed bindings
//! - Template, custom and time-series entry points
//! - Status, self-test and shutdown

mod common;

use approx::assert_relative_eq;
use common::{init_tracing, normal_scenario, seeded_config, seeded_engine};
use sim_engine::{
    AuditEventType, CacheBackend, CacheError, DataFeed, EngineConfig, FeedError, SimulationEngine,
    SimulationError, StaticDataFeed,
};
use sim_models::distributions::{Distribution, VariableDefinition};
use sim_models::scenarios::{
    generate_scenario, ScenarioTemplate, TemplateOverrides, TimeSeriesSpec, MAX_TIME_STEPS,
};
use sim_models::ScenarioConfig;
use sim_risk::stress::StressTestKind;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Accuracy
// ============================================================================

#[test]
fn e2e_normal_moments_and_tail() {
    let engine = seeded_engine(42);
    let result = engine
        .run_simulation(&normal_scenario(), Some(50_000), None)
        .unwrap();

    let stats = &result.statistics.as_ref().unwrap()["variable_0"];
    assert_relative_eq!(stats.mean, 100.0, epsilon = 0.5);
    assert_relative_eq!(stats.std, 15.0, epsilon = 0.5);

    // N(100, 15): 95th percentile 124.67, 99th 134.90
    let metrics = &result.risk_metrics.as_ref().unwrap()["variable_0"];
    assert_relative_eq!(metrics.var_95, 124.67, epsilon = 0.8);
    assert_relative_eq!(metrics.var_99, 134.90, epsilon = 1.2);
    assert!(metrics.cvar_95 >= metrics.var_95);
    assert!(metrics.cvar_99 >= metrics.var_99);

    assert_eq!(result.variable_names, vec!["loss"]);
    assert_eq!(result.sample_summary.n_rows, 50_000);
    assert_eq!(result.raw_samples.as_ref().unwrap().n_rows(), 50_000);
}

#[test]
fn e2e_all_analysis_blocks_present() {
    let engine = seeded_engine(3);
    let result = engine
        .run_scenario_simulation(
            ScenarioTemplate::RiskAssessment,
            &TemplateOverrides::default(),
            Some(5_000),
            None,
        )
        .unwrap();

    assert_eq!(result.statistics.as_ref().unwrap().len(), 3);
    assert_eq!(result.risk_metrics.as_ref().unwrap().len(), 3);
    assert_eq!(result.failure_analysis.as_ref().unwrap().len(), 3);

    let prioritization = result.risk_prioritization.as_ref().unwrap();
    assert_eq!(prioritization.ranking.len(), 3);
    assert_eq!(prioritization.critical.len(), 1);

    let stress = result.stress_testing.as_ref().unwrap();
    assert_eq!(stress.tests.len(), 5);
    assert!(stress.outcome(StressTestKind::ExtremeMarket).unwrap().impact > 0.0);

    let sensitivity = result.sensitivity.as_ref().unwrap();
    assert_eq!(sensitivity.variables.len(), 3);
    assert_eq!(result.summary.variable_count, 3);
    assert!(!result.summary.recommendations.is_empty());
}

// ============================================================================
// Sequential / Parallel Sampling
// ============================================================================

#[test]
fn e2e_parallel_matches_sequential_statistically() {
    let config = seeded_config(7).with_parallel_threshold(1_000);
    let par_engine = SimulationEngine::new(config.clone()).unwrap();
    let seq_engine = SimulationEngine::new(config).unwrap();

    let par = par_engine
        .run_simulation(&normal_scenario(), Some(40_000), Some(true))
        .unwrap();
    let seq = seq_engine
        .run_simulation(&normal_scenario(), Some(40_000), Some(false))
        .unwrap();

    assert!(par.parallel);
    assert!(!seq.parallel);
    assert_eq!(par.sample_summary.n_rows, 40_000);

    let p = &par.statistics.as_ref().unwrap()["variable_0"];
    let s = &seq.statistics.as_ref().unwrap()["variable_0"];
    assert_relative_eq!(p.mean, s.mean, epsilon = 0.5);
    assert_relative_eq!(p.std, s.std, epsilon = 0.5);
}

#[test]
fn e2e_parallel_run_is_reproducible() {
    let config = seeded_config(99).with_parallel_threshold(1_000);
    let a = SimulationEngine::new(config.clone()).unwrap();
    let b = SimulationEngine::new(config).unwrap();

    let ra = a.run_simulation(&normal_scenario(), Some(20_000), None).unwrap();
    let rb = b.run_simulation(&normal_scenario(), Some(20_000), None).unwrap();

    assert!(ra.parallel);
    assert_eq!(ra.raw_samples, rb.raw_samples);
    assert_eq!(ra.seed, rb.seed);
}

#[test]
fn e2e_below_threshold_runs_sequentially() {
    let engine = seeded_engine(1);
    let result = engine
        .run_simulation(&normal_scenario(), Some(500), Some(true))
        .unwrap();
    assert!(!result.parallel);
}

#[test]
fn e2e_stress_seed_override() {
    let engine = SimulationEngine::new(seeded_config(5).with_stress_seed(1234)).unwrap();
    let result = engine
        .run_simulation(&normal_scenario(), Some(1_000), None)
        .unwrap();
    assert_eq!(result.stress_testing.unwrap().seed, 1234);
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn e2e_second_run_is_cached() {
    let engine = seeded_engine(11);
    let scenario = generate_scenario(
        ScenarioTemplate::RiskAssessment,
        &TemplateOverrides::default(),
        None,
    )
    .unwrap();

    let first = engine.run_simulation(&scenario, Some(2_000), None).unwrap();
    let second = engine.run_simulation(&scenario, Some(2_000), None).unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.simulation_id, second.simulation_id);
    assert_eq!(first.variable_names, second.variable_names);

    let status = engine.cache_status();
    assert_eq!(status.hits, 1);
    assert_eq!(status.writes, 1);

    let audit = engine.audit_log();
    assert_eq!(audit.events_by_type(AuditEventType::Start).len(), 1);
    assert_eq!(audit.events_by_type(AuditEventType::Complete).len(), 2);
    assert_eq!(audit.events_for(first.simulation_id).len(), 3);
}

#[test]
fn e2e_different_iterations_miss_the_cache() {
    let engine = seeded_engine(11);
    let a = engine.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    let b = engine.run_simulation(&normal_scenario(), Some(1_001), None).unwrap();
    assert!(!b.cached);
    assert_ne!(a.simulation_id, b.simulation_id);
}

#[test]
fn e2e_cache_entries_expire() {
    let engine = SimulationEngine::new(seeded_config(2).with_cache_ttl_secs(1)).unwrap();
    let first = engine.run_simulation(&normal_scenario(), Some(500), None).unwrap();
    thread::sleep(Duration::from_millis(1_300));
    let second = engine.run_simulation(&normal_scenario(), Some(500), None).unwrap();

    assert!(!second.cached);
    assert_ne!(first.simulation_id, second.simulation_id);
}

#[test]
fn e2e_shared_directory_serves_other_engines() {
    let dir = tempfile::tempdir().unwrap();
    let config = seeded_config(21).with_shared_cache_dir(dir.path());

    let a = SimulationEngine::new(config.clone()).unwrap();
    let b = SimulationEngine::new(config).unwrap();
    assert!(a.cache_status().shared_tier.is_some());

    let first = a.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    let second = b.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();

    assert!(second.cached);
    assert_eq!(first.simulation_id, second.simulation_id);
}

/// Shared tier that answers pings at once but stalls on reads and writes.
struct StallingBackend;

impl CacheBackend for StallingBackend {
    fn name(&self) -> &str {
        "stalling"
    }
    fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
    fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        thread::sleep(Duration::from_secs(10));
        Ok(None)
    }
    fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        thread::sleep(Duration::from_secs(10));
        Ok(())
    }
}

#[test]
fn e2e_shared_directory_keeps_engine_settings_apart() {
    let dir = tempfile::tempdir().unwrap();
    let base = seeded_config(21).with_shared_cache_dir(dir.path());

    let writer = SimulationEngine::new(base.clone()).unwrap();
    let first = writer.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    assert!(first.raw_samples.is_some());

    let lean = SimulationEngine::new(base.clone().with_raw_samples(false)).unwrap();
    let lean_run = lean.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    assert!(!lean_run.cached);
    assert!(lean_run.raw_samples.is_none());

    let strict = SimulationEngine::new(base.clone().with_confidence_level(0.99)).unwrap();
    let strict_run = strict.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    assert!(!strict_run.cached);
    assert_ne!(strict_run.simulation_id, first.simulation_id);

    let reseeded = SimulationEngine::new(base.clone().with_seed(22)).unwrap();
    assert!(!reseeded.run_simulation(&normal_scenario(), Some(1_000), None).unwrap().cached);

    let twin = SimulationEngine::new(base).unwrap();
    let shared = twin.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    assert!(shared.cached);
    assert_eq!(shared.simulation_id, first.simulation_id);
}

#[test]
fn e2e_stalled_shared_backend_does_not_block_runs() {
    let engine = seeded_engine(31).with_shared_cache(Arc::new(StallingBackend));
    assert_eq!(engine.cache_status().shared_tier.as_deref(), Some("stalling"));

    let started = Instant::now();
    let first = engine.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    let second = engine.run_simulation(&normal_scenario(), Some(1_000), None).unwrap();
    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.simulation_id, second.simulation_id);
}

#[test]
fn e2e_unreachable_shared_tier_falls_back_to_local() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let unreachable = blocker.path().join("cache");

    let degraded =
        SimulationEngine::new(seeded_config(8).with_shared_cache_dir(&unreachable)).unwrap();
    let local = SimulationEngine::new(seeded_config(8)).unwrap();
    assert!(degraded.cache_status().shared_tier.is_none());

    let a = degraded.run_simulation(&normal_scenario(), Some(2_000), None).unwrap();
    let b = local.run_simulation(&normal_scenario(), Some(2_000), None).unwrap();
    assert_eq!(a.raw_samples, b.raw_samples);
    assert_eq!(a.statistics, b.statistics);

    let again = degraded.run_simulation(&normal_scenario(), Some(2_000), None).unwrap();
    assert!(again.cached);
}

// ============================================================================
// Data Feeds
// ============================================================================

fn bound_scenario() -> ScenarioConfig {
    ScenarioConfig::builder("bound")
        .variable("loss", Distribution::Normal { mean: 0.0, std: 15.0 })
        .bind("loss", "mean", "market.loss_level")
        .build()
        .unwrap()
}

#[test]
fn e2e_binding_resolved_from_feed() {
    let feed = Arc::new(StaticDataFeed::new().with_value("market.loss_level", 500.0));
    let engine = seeded_engine(4).with_data_feed(feed);

    let result = engine.run_simulation(&bound_scenario(), Some(20_000), None).unwrap();
    let stats = &result.statistics.as_ref().unwrap()["variable_0"];
    assert_relative_eq!(stats.mean, 500.0, epsilon = 1.0);
    assert_eq!(
        result.scenario.variables[0].distribution,
        Distribution::Normal { mean: 500.0, std: 15.0 }
    );
}

struct FailingFeed;

impl DataFeed for FailingFeed {
    fn fetch(&self, source: &str) -> Result<f64, FeedError> {
        Err(FeedError::Unavailable {
            source_name: source.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

#[test]
fn e2e_feed_failure_is_audited_and_not_cached() {
    let engine = seeded_engine(4).with_data_feed(Arc::new(FailingFeed));

    let err = engine.run_simulation(&bound_scenario(), Some(500), None).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::DataFeed(FeedError::Unavailable { .. })
    ));
    assert_eq!(engine.cache_status().writes, 0);

    let errors = engine.audit_log().events_by_type(AuditEventType::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].details["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    assert!(engine.run_simulation(&bound_scenario(), Some(500), None).is_err());
    assert_eq!(engine.audit_log().events_by_type(AuditEventType::Error).len(), 2);
}

#[test]
fn e2e_invalid_scenario_is_rejected_before_sampling() {
    let engine = seeded_engine(4);
    let mut scenario = normal_scenario();
    scenario.variables[0].distribution = Distribution::Normal { mean: 0.0, std: -1.0 };

    let err = engine.run_simulation(&scenario, Some(500), None).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Scenario(_) | SimulationError::Distribution(_)
    ));
    assert_eq!(engine.audit_log().events_by_type(AuditEventType::Error).len(), 1);
    assert_eq!(engine.cache_status().writes, 0);
}

// ============================================================================
// Entry Points
// ============================================================================

#[test]
fn e2e_custom_simulation_is_uncorrelated_by_default() {
    let engine = seeded_engine(6);
    let vars = [
        VariableDefinition::new("a", Distribution::Uniform { low: 0.0, high: 1.0 }),
        VariableDefinition::new("b", Distribution::Exponential { scale: 2.0 }),
    ];

    let result = engine.run_custom_simulation(&vars, None, Some(1_000)).unwrap();
    assert_eq!(result.scenario.name, "custom_simulation");
    assert!(result.scenario.correlation_matrix.is_identity());
    assert_eq!(result.variable_names, vec!["a", "b"]);
}

#[test]
fn e2e_template_with_time_horizon_projects() {
    let engine = seeded_engine(9);
    let result = engine
        .run_scenario_simulation(
            ScenarioTemplate::RiskAssessment,
            &TemplateOverrides::default(),
            Some(2_000),
            Some(6),
        )
        .unwrap();

    let projection = result.time_series.unwrap();
    assert_eq!(projection.time_steps, 6);
    assert_eq!(projection.trajectories.len(), 3);
}

#[test]
fn e2e_time_series_simulation() {
    let engine = seeded_engine(10);
    let result = engine
        .run_time_series_simulation(&normal_scenario(), 12, Some(5_000))
        .unwrap();

    let projection = result.time_series.as_ref().unwrap();
    let trajectory = &projection.trajectories["variable_0"];
    assert_eq!(trajectory.mean.len(), 12);
    for t in 0..12 {
        assert!(trajectory.p5[t] <= trajectory.mean[t]);
        assert!(trajectory.mean[t] <= trajectory.p95[t]);
    }
}

#[test]
fn e2e_oversized_time_horizon_rejected() {
    let engine = seeded_engine(10);
    let err = engine
        .run_time_series_simulation(&normal_scenario(), usize::MAX, Some(10))
        .unwrap_err();
    assert!(matches!(err, SimulationError::Scenario(_)));

    let mut scenario = normal_scenario();
    scenario.time_series = Some(TimeSeriesSpec {
        time_steps: MAX_TIME_STEPS + 1,
        parameters: Default::default(),
    });
    let err = engine.run_simulation(&scenario, Some(10), None).unwrap_err();
    assert!(matches!(err, SimulationError::Scenario(_)));

    let audit = engine.audit_log();
    assert_eq!(audit.events_by_type(AuditEventType::Start).len(), 1);
    assert_eq!(audit.events_by_type(AuditEventType::Error).len(), 1);
}

#[test]
fn e2e_default_iterations_used() {
    let engine =
        SimulationEngine::new(EngineConfig::default().with_default_iterations(777)).unwrap();
    let result = engine.run_simulation(&normal_scenario(), None, None).unwrap();
    assert_eq!(result.iterations, 777);
}

// ============================================================================
// Status, Self-Test, Shutdown
// ============================================================================

#[test]
fn e2e_status_reports_engine_state() {
    let engine = seeded_engine(12);
    engine.run_simulation(&normal_scenario(), Some(500), None).unwrap();

    let status = engine.get_simulation_status();
    assert_eq!(status.max_workers, 4);
    assert!(status.worker_count >= 1 && status.worker_count <= 4);
    assert_eq!(status.audit_events, 2);
    assert_eq!(status.audit_events_evicted, 0);
    assert_eq!(status.scenario_templates.len(), ScenarioTemplate::ALL.len());
    assert!(status.supported_distributions.iter().any(|d| d == "normal"));
    assert!(!status.shut_down);
}

#[test]
fn e2e_audit_limit_reports_evictions() {
    init_tracing();
    let engine = SimulationEngine::new(seeded_config(13).with_max_audit_events(3)).unwrap();
    for n in 0..3 {
        engine.run_simulation(&normal_scenario(), Some(500 + n), None).unwrap();
    }

    let status = engine.get_simulation_status();
    assert_eq!(status.audit_events, 3);
    assert_eq!(status.audit_events_evicted, 3);
    assert_eq!(engine.audit_log().max_events(), 3);
}

#[test]
fn e2e_self_test_healthy() {
    let report = seeded_engine(13).validate_configuration();
    assert!(report.is_healthy());
    let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "worker_pool",
            "distribution_sampling",
            "correlation_matrix",
            "scenario_generation"
        ]
    );
}

#[test]
fn e2e_shutdown_rejects_new_runs() {
    let engine = seeded_engine(14);
    engine.shutdown();
    engine.shutdown();

    assert!(matches!(
        engine.run_simulation(&normal_scenario(), Some(100), None),
        Err(SimulationError::EngineShutdown)
    ));
    let report = engine.validate_configuration();
    assert!(!report.is_healthy());
    assert_eq!(report.failures().count(), 1);
}

#[test]
fn e2e_engine_shared_across_threads() {
    let engine = Arc::new(seeded_engine(15));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .run_simulation(&normal_scenario(), Some(1_000 + i), None)
                    .map(|r| r.iterations)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap().unwrap(), 1_000 + i);
    }
    assert_eq!(engine.audit_log().count(), 8);
}
