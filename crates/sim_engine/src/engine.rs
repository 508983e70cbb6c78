//! The simulation engine: validation, sampling, analysis, caching, audit.

use chrono::Utc;
use rayon::ThreadPool;
use serde_json::json;
use sim_core::math::{mean, std_dev};
use sim_core::rng::{derive_seed, SimRng};
use sim_core::SampleMatrix;
use sim_models::correlation::{
    generate_correlation_matrix, validate_correlation_matrix, CorrelationMatrix, MatrixMethod,
};
use sim_models::distributions::{
    list_supported_distributions, sample_variables, Distribution, VariableDefinition,
};
use sim_models::scenarios::{
    generate_scenario, generate_time_series_scenario, validate_scenario, FeatureFlags,
    ScenarioConfig, ScenarioError, ScenarioTemplate, TemplateOverrides,
};
use sim_risk::{
    calculate_failure_modes, calculate_risk_metrics, calculate_statistics,
    generate_summary_report, perform_sensitivity_analysis, perform_stress_tests,
    prioritize_risks, FailureModes, RiskPrioritization, SensitivityReport, StressTestConfig,
    StressTestReport, SummaryReport, VariableRiskMetrics, VariableStatistics,
};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEventType, AuditLog};
use crate::cache::{cache_key, CacheBackend, CacheStatus, FileCache, ResultSettings, TieredCache};
use crate::config::EngineConfig;
use crate::error::SimulationError;
use crate::feed::{DataFeed, FeedError};
use crate::result::{EngineStatus, HealthCheck, HealthReport, SimulationResult};
use crate::sampling::{sample_parallel, sample_sequential};
use crate::time_series::project_time_series;

/// RNG stream of the correlation-breakdown permutation.
const STRESS_STREAM: u64 = u64::MAX;
/// RNG stream of the time-series projection.
const PROJECTION_STREAM: u64 = u64::MAX - 1;
/// Rows drawn by each self-test step.
const SELF_TEST_ITERATIONS: usize = 1_000;

/// Analysis blocks of one run.
struct Analysis {
    statistics: Option<BTreeMap<String, VariableStatistics>>,
    risk_metrics: Option<BTreeMap<String, VariableRiskMetrics>>,
    failure_analysis: Option<BTreeMap<String, FailureModes>>,
    risk_prioritization: Option<RiskPrioritization>,
    stress_testing: Option<StressTestReport>,
    sensitivity: Option<SensitivityReport>,
    summary: SummaryReport,
}

/// Monte Carlo simulation engine.
///
/// Owns a bounded rayon pool, a two-tier result cache and the audit log.
/// Construct one per process (or per test) and share it by reference or
/// `Arc`; every method takes `&self`.
///
/// # Example
///
/// ```
/// use sim_engine::{EngineConfig, SimulationEngine};
/// use sim_models::scenarios::{ScenarioTemplate, TemplateOverrides};
///
/// let engine = SimulationEngine::new(EngineConfig::default().with_seed(7)).unwrap();
/// let result = engine
///     .run_scenario_simulation(
///         ScenarioTemplate::RiskAssessment,
///         &TemplateOverrides::default(),
///         Some(2_000),
///         None,
///     )
///     .unwrap();
///
/// assert_eq!(result.iterations, 2_000);
/// assert_eq!(result.variable_names.len(), 3);
/// assert!(result.statistics.unwrap().contains_key("variable_0"));
/// ```
pub struct SimulationEngine {
    config: EngineConfig,
    cache: TieredCache,
    audit: AuditLog,
    feed: Option<Arc<dyn DataFeed>>,
    pool: RwLock<Option<Arc<ThreadPool>>>,
    worker_count: usize,
}

impl SimulationEngine {
    /// Validates `config`, starts the worker pool and pings the shared
    /// cache tier.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Config`] if `config` fails validation
    /// - [`SimulationError::ThreadPool`] if the pool cannot be started
    pub fn new(config: EngineConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let worker_count = config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("sim-worker-{}", i))
            .build()
            .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;

        let shared = config
            .shared_cache_dir
            .as_ref()
            .map(|dir| Arc::new(FileCache::new(dir)) as Arc<dyn CacheBackend>);
        let cache = TieredCache::new(
            config.local_cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
            shared,
            Duration::from_millis(config.probe_timeout_ms),
        );

        info!(
            worker_count,
            parallel_threshold = config.parallel_threshold,
            shared_cache = cache.has_shared_tier(),
            "simulation engine started"
        );

        Ok(Self {
            audit: AuditLog::with_max_events(config.max_audit_events),
            config,
            cache,
            feed: None,
            pool: RwLock::new(Some(Arc::new(pool))),
            worker_count,
        })
    }

    /// Engine with [`EngineConfig::default`].
    pub fn with_defaults() -> Result<Self, SimulationError> {
        Self::new(EngineConfig::default())
    }

    /// Installs the feed used to resolve data bindings.
    pub fn with_data_feed(mut self, feed: Arc<dyn DataFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Pings `backend` and, if it answers in time, uses it as the shared
    /// cache tier in place of any configured one.
    pub fn with_shared_cache(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        self.cache.attach_shared(backend, timeout);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Audit trail.
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Cache counters.
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Threads in the worker pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Releases the worker pool. Later runs fail with
    /// [`SimulationError::EngineShutdown`].
    ///
    /// Runs already in flight keep their handle to the pool and finish.
    pub fn shutdown(&self) {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if pool.is_some() {
            info!(audit_events = self.audit.count(), "simulation engine shut down");
        }
    }

    fn pool(&self) -> Result<Arc<ThreadPool>, SimulationError> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SimulationError::EngineShutdown)
    }

    fn resolve_iterations(&self, iterations: Option<usize>) -> Result<usize, SimulationError> {
        let requested = iterations.unwrap_or(self.config.default_iterations);
        if requested == 0 || requested > self.config.max_iterations {
            return Err(SimulationError::InvalidIterations {
                requested,
                max: self.config.max_iterations,
            });
        }
        Ok(requested)
    }

    fn cached_result(&self, key: &str) -> Option<SimulationResult> {
        let json = self.cache.get(key)?;
        match serde_json::from_str::<SimulationResult>(&json) {
            Ok(mut result) => {
                result.cached = true;
                Some(result)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Runs a scenario end to end.
    ///
    /// # Algorithm
    ///
    /// 1. Look the run up in the cache by scenario, iterations and the
    ///    [`ResultSettings`] of this engine; a hit is returned with
    ///    `cached = true`
    /// 2. Validate the scenario and resolve its data bindings
    /// 3. Sample: runs with `parallel` (default `true`) and more than
    ///    `parallel_threshold` iterations are split into one contiguous
    ///    chunk per worker, each with its own seeded stream, and
    ///    concatenated in chunk order; others sample in one pass
    /// 4. Analyse the sample with the blocks the feature flags enable
    /// 5. Write the result through to the cache and audit the run
    ///
    /// Analysis blocks are keyed by positional column name (`variable_0`,
    /// ...); `variable_names` holds the declared names.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::EngineShutdown`] after [`shutdown`](Self::shutdown)
    /// - [`SimulationError::InvalidIterations`] outside `1..=max_iterations`
    /// - [`SimulationError::Scenario`] / [`SimulationError::Distribution`] /
    ///   [`SimulationError::Correlation`] if the scenario is invalid; nothing
    ///   is sampled in that case
    /// - [`SimulationError::DataFeed`] if a binding cannot be resolved
    /// - [`SimulationError::WorkerPool`] if a sampling chunk fails
    ///
    /// Every failure after the cache lookup is recorded as an `error` audit
    /// event and leaves the cache untouched.
    pub fn run_simulation(
        &self,
        config: &ScenarioConfig,
        iterations: Option<usize>,
        parallel: Option<bool>,
    ) -> Result<SimulationResult, SimulationError> {
        let pool = self.pool()?;
        let iterations = self.resolve_iterations(iterations)?;
        let parallel = parallel.unwrap_or(true);
        let classification = self.config.data_classification;

        let key = match cache_key(config, iterations, &ResultSettings::from(&self.config)) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(scenario = %config.name, error = %e, "cannot derive cache key; caching disabled for this run");
                None
            }
        };

        if let Some(result) = key.as_deref().and_then(|k| self.cached_result(k)) {
            info!(
                simulation_id = %result.simulation_id,
                scenario = %config.name,
                iterations,
                "simulation served from cache"
            );
            self.audit.record(
                AuditEventType::Complete,
                result.simulation_id,
                json!({
                    "scenario": config.name,
                    "iterations": iterations,
                    "cached": true,
                }),
                classification,
            );
            return Ok(result);
        }

        let simulation_id = Uuid::new_v4();
        self.audit.record(
            AuditEventType::Start,
            simulation_id,
            json!({
                "scenario": config.name,
                "iterations": iterations,
                "parallel_requested": parallel,
            }),
            classification,
        );
        info!(%simulation_id, scenario = %config.name, iterations, parallel, "simulation started");

        match self.execute(&pool, simulation_id, config, iterations, parallel) {
            Ok(result) => {
                if let Some(key) = &key {
                    match serde_json::to_string(&result) {
                        Ok(json) => self.cache.set(key, &json),
                        Err(e) => warn!(%simulation_id, error = %e, "result not cached"),
                    }
                }
                let duration_ms = result.duration().num_milliseconds();
                self.audit.record(
                    AuditEventType::Complete,
                    simulation_id,
                    json!({
                        "scenario": config.name,
                        "iterations": iterations,
                        "parallel": result.parallel,
                        "cached": false,
                        "duration_ms": duration_ms,
                    }),
                    classification,
                );
                info!(%simulation_id, duration_ms, parallel = result.parallel, "simulation complete");
                Ok(result)
            }
            Err(e) => {
                self.audit.record(
                    AuditEventType::Error,
                    simulation_id,
                    json!({
                        "scenario": config.name,
                        "iterations": iterations,
                        "error": e.to_string(),
                    }),
                    classification,
                );
                error!(%simulation_id, error = %e, "simulation failed");
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        pool: &ThreadPool,
        simulation_id: Uuid,
        config: &ScenarioConfig,
        iterations: usize,
        parallel: bool,
    ) -> Result<SimulationResult, SimulationError> {
        let start_time = Utc::now();
        validate_scenario(config)?;
        let scenario = self.resolve_bindings(config)?;

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let use_parallel = parallel && iterations > self.config.parallel_threshold;
        let named = if use_parallel {
            sample_parallel(pool, &scenario, iterations, self.worker_count, seed)?
        } else {
            sample_sequential(&scenario, iterations, seed)?
        };
        debug!(%simulation_id, seed, parallel = use_parallel, rows = named.n_rows(), "sampling finished");

        let (variable_names, columns) = named.into_parts();
        let samples = SampleMatrix::from_unnamed_columns(columns)?;
        let thresholds = scenario.thresholds_by_index();
        let stress = StressTestConfig::with_seed(
            self.config
                .stress_seed
                .unwrap_or_else(|| derive_seed(seed, STRESS_STREAM)),
        );

        let analysis =
            pool.install(|| self.analyse(&samples, &thresholds, &scenario.features, &stress))?;

        let time_series = scenario.time_series.as_ref().map(|spec| {
            let mut rng = SimRng::for_stream(seed, PROJECTION_STREAM);
            project_time_series(
                &samples,
                &scenario.time_series_params(),
                spec.time_steps,
                &mut rng,
            )
        });

        Ok(SimulationResult {
            simulation_id,
            start_time,
            end_time: Utc::now(),
            iterations,
            statistics: analysis.statistics,
            risk_metrics: analysis.risk_metrics,
            failure_analysis: analysis.failure_analysis,
            risk_prioritization: analysis.risk_prioritization,
            stress_testing: analysis.stress_testing,
            sensitivity: analysis.sensitivity,
            summary: analysis.summary,
            variable_names,
            sample_summary: samples.summary(),
            raw_samples: self.config.include_raw_samples.then_some(samples),
            time_series,
            features: scenario.features,
            parallel: use_parallel,
            seed,
            cached: false,
            scenario,
        })
    }

    fn analyse(
        &self,
        samples: &SampleMatrix,
        thresholds: &[Option<f64>],
        features: &FeatureFlags,
        stress: &StressTestConfig,
    ) -> Result<Analysis, SimulationError> {
        Ok(Analysis {
            statistics: features
                .include_statistics
                .then(|| calculate_statistics(samples))
                .transpose()?,
            risk_metrics: features
                .include_risk_metrics
                .then(|| calculate_risk_metrics(samples, self.config.confidence_level, thresholds))
                .transpose()?,
            failure_analysis: features
                .include_failure_analysis
                .then(|| calculate_failure_modes(samples))
                .transpose()?,
            risk_prioritization: features
                .include_risk_prioritization
                .then(|| prioritize_risks(samples, thresholds))
                .transpose()?,
            stress_testing: features
                .include_stress_testing
                .then(|| perform_stress_tests(samples, stress))
                .transpose()?,
            sensitivity: features
                .include_sensitivity_analysis
                .then(|| perform_sensitivity_analysis(samples))
                .transpose()?,
            summary: generate_summary_report(samples, thresholds)?,
        })
    }

    /// Copies `config` with every data binding replaced by its live value.
    fn resolve_bindings(&self, config: &ScenarioConfig) -> Result<ScenarioConfig, SimulationError> {
        if config.data_bindings.is_empty() {
            return Ok(config.clone());
        }

        let mut resolved = config.clone();
        for binding in &config.data_bindings {
            let feed = self
                .feed
                .as_ref()
                .ok_or_else(|| FeedError::NotConfigured(binding.source.clone()))?;
            let value = feed.fetch(&binding.source)?;

            let variable = resolved
                .variables
                .iter_mut()
                .find(|v| v.name == binding.variable)
                .ok_or_else(|| ScenarioError::UnknownVariable(binding.variable.clone()))?;
            variable.distribution = variable
                .distribution
                .with_parameter(&binding.parameter, value)?;

            debug!(
                variable = %binding.variable,
                parameter = %binding.parameter,
                source = %binding.source,
                value,
                "data binding resolved"
            );
        }

        validate_scenario(&resolved)?;
        Ok(resolved)
    }

    /// Generates a scenario from `template` and runs it.
    ///
    /// `time_horizon` adds a time-series projection of that many steps.
    pub fn run_scenario_simulation(
        &self,
        template: ScenarioTemplate,
        overrides: &TemplateOverrides,
        iterations: Option<usize>,
        time_horizon: Option<usize>,
    ) -> Result<SimulationResult, SimulationError> {
        let config = generate_scenario(template, overrides, time_horizon)?;
        self.run_simulation(&config, iterations, None)
    }

    /// Runs ad-hoc variables, uncorrelated unless `correlations` is given.
    pub fn run_custom_simulation(
        &self,
        variables: &[VariableDefinition],
        correlations: Option<CorrelationMatrix>,
        iterations: Option<usize>,
    ) -> Result<SimulationResult, SimulationError> {
        let mut builder = ScenarioConfig::builder("custom_simulation");
        for var in variables {
            builder = builder.variable(var.name.clone(), var.distribution);
        }
        if let Some(matrix) = correlations {
            builder = builder.correlation(matrix);
        }
        let config = builder.build()?;
        self.run_simulation(&config, iterations, None)
    }

    /// Runs `base` with a mean-reverting projection over `time_steps`.
    ///
    /// Existing time-series parameters on `base` are kept; other variables
    /// get the defaults.
    pub fn run_time_series_simulation(
        &self,
        base: &ScenarioConfig,
        time_steps: usize,
        iterations: Option<usize>,
    ) -> Result<SimulationResult, SimulationError> {
        let config = generate_time_series_scenario(base, time_steps)?;
        self.run_simulation(&config, iterations, None)
    }

    /// Snapshot of engine state.
    pub fn get_simulation_status(&self) -> EngineStatus {
        EngineStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            worker_count: self.worker_count,
            max_workers: self.config.max_workers,
            parallel_threshold: self.config.parallel_threshold,
            default_iterations: self.config.default_iterations,
            cache: self.cache.status(),
            audit_events: self.audit.count(),
            audit_events_evicted: self.audit.evicted(),
            data_classification: self.config.data_classification,
            supported_distributions: list_supported_distributions()
                .into_iter()
                .map(String::from)
                .collect(),
            scenario_templates: ScenarioTemplate::ALL
                .iter()
                .map(|t| t.name().to_string())
                .collect(),
            shut_down: self.is_shut_down(),
        }
    }

    /// Self-test of the sampling, correlation and scenario paths.
    ///
    /// Never fails; failing steps are reported in the [`HealthReport`].
    pub fn validate_configuration(&self) -> HealthReport {
        let mut checks = Vec::new();
        let mut check = |name: &str, outcome: Result<String, String>| {
            let (passed, detail) = match outcome {
                Ok(detail) => (true, detail),
                Err(detail) => (false, detail),
            };
            if !passed {
                warn!(check = name, %detail, "self-test step failed");
            }
            checks.push(HealthCheck {
                name: name.to_string(),
                passed,
                detail,
            });
        };

        check(
            "worker_pool",
            self.pool()
                .map(|p| format!("{} worker thread(s)", p.current_num_threads()))
                .map_err(|e| e.to_string()),
        );

        check("distribution_sampling", {
            let vars = [VariableDefinition::new(
                "self_test",
                Distribution::Normal { mean: 0.0, std: 1.0 },
            )];
            sample_variables(&vars, SELF_TEST_ITERATIONS, &mut SimRng::from_seed(0))
                .map_err(|e| e.to_string())
                .and_then(|s| {
                    let (m, sd) = (mean(s.column(0)), std_dev(s.column(0)));
                    if m.abs() < 0.2 && (sd - 1.0).abs() < 0.2 {
                        Ok(format!("standard normal sample mean {:.4}, std {:.4}", m, sd))
                    } else {
                        Err(format!("standard normal sample off target: mean {:.4}, std {:.4}", m, sd))
                    }
                })
        });

        check(
            "correlation_matrix",
            generate_correlation_matrix(4, &MatrixMethod::toeplitz(0.5))
                .map_err(|e| e.to_string())
                .and_then(|m| {
                    if validate_correlation_matrix(&m.rows()) {
                        Ok("4x4 Toeplitz matrix validated".to_string())
                    } else {
                        Err("generated Toeplitz matrix failed validation".to_string())
                    }
                }),
        );

        check(
            "scenario_generation",
            generate_scenario(ScenarioTemplate::RiskAssessment, &TemplateOverrides::default(), None)
                .map_err(|e| e.to_string())
                .and_then(|config| {
                    validate_scenario(&config).map_err(|e| e.to_string())?;
                    let samples = sample_sequential(&config, SELF_TEST_ITERATIONS, 0)
                        .map_err(|e| e.to_string())?;
                    let stats = calculate_statistics(&samples).map_err(|e| e.to_string())?;
                    Ok(format!(
                        "{} scenario sampled and analysed ({} variables)",
                        config.name,
                        stats.len()
                    ))
                }),
        );

        let report = HealthReport { checks };
        info!(healthy = report.is_healthy(), "self-test finished");
        report
    }
}
