//! Scenario configuration types, builder and validation.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::ScenarioError;
use crate::correlation::{check_correlation_matrix, Copula, CorrelationMatrix};
use crate::distributions::{Distribution, VariableDefinition};

/// Default volatility decay per time step.
pub const DEFAULT_VOLATILITY_DECAY: f64 = 0.95;

/// Default mean-reversion speed per time step.
pub const DEFAULT_MEAN_REVERSION: f64 = 0.1;

/// Longest time-series projection a scenario may request.
pub const MAX_TIME_STEPS: usize = 10_000;

/// Which analysis blocks a simulation produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Descriptive statistics per variable
    pub include_statistics: bool,
    /// VaR, CVaR and failure probability
    pub include_risk_metrics: bool,
    /// Severity-level failure analysis and trend
    pub include_failure_analysis: bool,
    /// Composite-score ranking
    pub include_risk_prioritization: bool,
    /// The five stress scenarios
    pub include_stress_testing: bool,
    /// Correlation of each input with the aggregate output
    pub include_sensitivity_analysis: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl FeatureFlags {
    /// Every block enabled.
    pub fn all() -> Self {
        Self {
            include_statistics: true,
            include_risk_metrics: true,
            include_failure_analysis: true,
            include_risk_prioritization: true,
            include_stress_testing: true,
            include_sensitivity_analysis: true,
        }
    }

    /// Every block disabled; the summary is still produced.
    pub fn none() -> Self {
        Self {
            include_statistics: false,
            include_risk_metrics: false,
            include_failure_analysis: false,
            include_risk_prioritization: false,
            include_stress_testing: false,
            include_sensitivity_analysis: false,
        }
    }
}

/// Per-variable time-series dynamics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesParams {
    /// Multiplicative volatility decay per step, in (0, 1]
    pub volatility_decay: f64,
    /// Pull towards the long-run mean per step, in [0, 1]
    pub mean_reversion: f64,
}

impl Default for TimeSeriesParams {
    fn default() -> Self {
        Self {
            volatility_decay: DEFAULT_VOLATILITY_DECAY,
            mean_reversion: DEFAULT_MEAN_REVERSION,
        }
    }
}

/// Time-series projection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSpec {
    /// Number of projection steps (>= 1)
    pub time_steps: usize,
    /// Dynamics per variable name
    #[serde(default)]
    pub parameters: BTreeMap<String, TimeSeriesParams>,
}

/// A distribution parameter resolved from a live data feed before sampling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataBinding {
    /// Variable whose distribution is updated
    pub variable: String,
    /// Parameter name within that distribution
    pub parameter: String,
    /// Feed source identifier
    pub source: String,
}

/// A complete, typed scenario.
///
/// Construct with [`ScenarioConfig::builder`], a template via
/// [`generate_scenario`](super::generate_scenario), or deserialise and then
/// call [`validate_scenario`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name
    pub name: String,
    /// Variables in column order
    pub variables: Vec<VariableDefinition>,
    /// N×N correlation between the variables
    pub correlation_matrix: CorrelationMatrix,
    /// Analysis blocks to produce
    #[serde(default)]
    pub features: FeatureFlags,
    /// Dependence structure
    #[serde(default)]
    pub copula: Copula,
    /// Optional time-series projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeriesSpec>,
    /// Late-bound parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_bindings: Vec<DataBinding>,
    /// External failure thresholds per variable name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failure_thresholds: BTreeMap<String, f64>,
    /// Named output metrics reported by the scenario
    #[serde(default)]
    pub output_metrics: Vec<String>,
}

impl ScenarioConfig {
    /// Creates a builder for a scenario called `name`.
    pub fn builder(name: impl Into<String>) -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::new(name)
    }

    /// Variable names in column order.
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    /// Column index of variable `name`.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Failure thresholds in column order (`None` where not configured).
    pub fn thresholds_by_index(&self) -> Vec<Option<f64>> {
        self.variables
            .iter()
            .map(|v| self.failure_thresholds.get(&v.name).copied())
            .collect()
    }
}

/// Validates every structural invariant of a scenario.
///
/// # Checks
///
/// - At least one variable; names non-empty and unique
/// - Every distribution's parameters in domain
/// - Correlation matrix dimension equals the variable count, and the matrix
///   is a valid correlation matrix
/// - Copula parameters valid
/// - Bindings, thresholds and time-series parameters name declared
///   variables; bound parameters exist on the distribution
/// - Thresholds finite; time-series settings in range
///
/// # Errors
///
/// [`ScenarioError::Validation`] for structural problems,
/// [`ScenarioError::Distribution`] / [`ScenarioError::Correlation`] for
/// parameter-domain problems.
pub fn validate_scenario(config: &ScenarioConfig) -> Result<(), ScenarioError> {
    if config.variables.is_empty() {
        return Err(ScenarioError::validation("scenario declares no variables"));
    }

    let mut seen = HashSet::new();
    for var in &config.variables {
        if var.name.trim().is_empty() {
            return Err(ScenarioError::validation("variable names must be non-empty"));
        }
        if !seen.insert(var.name.as_str()) {
            return Err(ScenarioError::validation(format!(
                "duplicate variable name '{}'",
                var.name
            )));
        }
        var.distribution.validate()?;
    }

    let n = config.variables.len();
    if config.correlation_matrix.dim() != n {
        return Err(ScenarioError::validation(format!(
            "correlation matrix is {0}x{0} but {1} variables are declared",
            config.correlation_matrix.dim(),
            n
        )));
    }
    check_correlation_matrix(&config.correlation_matrix.rows())?;
    config.copula.validate()?;

    for binding in &config.data_bindings {
        let var = config
            .variables
            .iter()
            .find(|v| v.name == binding.variable)
            .ok_or_else(|| {
                ScenarioError::validation(format!(
                    "data binding references undeclared variable '{}'",
                    binding.variable
                ))
            })?;
        let known = var
            .distribution
            .parameters()
            .iter()
            .any(|(name, _)| *name == binding.parameter);
        if !known {
            return Err(ScenarioError::validation(format!(
                "data binding for '{}' targets unknown {} parameter '{}'",
                binding.variable,
                var.distribution.kind(),
                binding.parameter
            )));
        }
        if binding.source.trim().is_empty() {
            return Err(ScenarioError::validation(format!(
                "data binding for '{}.{}' has an empty source",
                binding.variable, binding.parameter
            )));
        }
    }

    for (name, threshold) in &config.failure_thresholds {
        if !seen.contains(name.as_str()) {
            return Err(ScenarioError::validation(format!(
                "failure threshold references undeclared variable '{}'",
                name
            )));
        }
        if !threshold.is_finite() {
            return Err(ScenarioError::validation(format!(
                "failure threshold for '{}' must be finite",
                name
            )));
        }
    }

    if let Some(ts) = &config.time_series {
        if ts.time_steps == 0 {
            return Err(ScenarioError::validation("time_steps must be at least 1"));
        }
        if ts.time_steps > MAX_TIME_STEPS {
            return Err(ScenarioError::validation(format!(
                "time_steps {} exceeds maximum allowed ({})",
                ts.time_steps, MAX_TIME_STEPS
            )));
        }
        for (name, params) in &ts.parameters {
            if !seen.contains(name.as_str()) {
                return Err(ScenarioError::validation(format!(
                    "time-series parameters reference undeclared variable '{}'",
                    name
                )));
            }
            if !(params.volatility_decay > 0.0 && params.volatility_decay <= 1.0) {
                return Err(ScenarioError::validation(format!(
                    "volatility_decay for '{}' must lie in (0, 1], got {}",
                    name, params.volatility_decay
                )));
            }
            if !(0.0..=1.0).contains(&params.mean_reversion) {
                return Err(ScenarioError::validation(format!(
                    "mean_reversion for '{}' must lie in [0, 1], got {}",
                    name, params.mean_reversion
                )));
            }
        }
    }

    Ok(())
}

/// Builder for [`ScenarioConfig`].
///
/// Provides a fluent API with validation at build time. When no
/// correlation matrix is given the variables are independent.
///
/// # Examples
///
/// ```rust
/// use sim_models::correlation::CorrelationMatrix;
/// use sim_models::distributions::Distribution;
/// use sim_models::scenarios::ScenarioConfig;
///
/// let config = ScenarioConfig::builder("inventory")
///     .variable("demand", Distribution::Normal { mean: 1000.0, std: 150.0 })
///     .variable("lead_time", Distribution::Gamma { shape: 4.0, scale: 2.5 })
///     .correlation(CorrelationMatrix::from_rows(&[vec![1.0, 0.3], vec![0.3, 1.0]]).unwrap())
///     .failure_threshold("demand", 1_300.0)
///     .build()
///     .expect("valid scenario");
///
/// assert_eq!(config.variables.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct ScenarioConfigBuilder {
    name: String,
    variables: Vec<VariableDefinition>,
    correlation: Option<CorrelationMatrix>,
    features: FeatureFlags,
    copula: Copula,
    time_series: Option<TimeSeriesSpec>,
    data_bindings: Vec<DataBinding>,
    failure_thresholds: BTreeMap<String, f64>,
    output_metrics: Vec<String>,
}

impl ScenarioConfigBuilder {
    /// Starts a scenario called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            correlation: None,
            features: FeatureFlags::default(),
            copula: Copula::default(),
            time_series: None,
            data_bindings: Vec::new(),
            failure_thresholds: BTreeMap::new(),
            output_metrics: Vec::new(),
        }
    }

    /// Appends a variable.
    #[inline]
    pub fn variable(mut self, name: impl Into<String>, distribution: Distribution) -> Self {
        self.variables.push(VariableDefinition::new(name, distribution));
        self
    }

    /// Sets the correlation matrix.
    #[inline]
    pub fn correlation(mut self, matrix: CorrelationMatrix) -> Self {
        self.correlation = Some(matrix);
        self
    }

    /// Sets the feature flags.
    #[inline]
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets the copula.
    #[inline]
    pub fn copula(mut self, copula: Copula) -> Self {
        self.copula = copula;
        self
    }

    /// Sets the time-series projection.
    #[inline]
    pub fn time_series(mut self, spec: TimeSeriesSpec) -> Self {
        self.time_series = Some(spec);
        self
    }

    /// Binds `variable.parameter` to a data feed source.
    pub fn bind(
        mut self,
        variable: impl Into<String>,
        parameter: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.data_bindings.push(DataBinding {
            variable: variable.into(),
            parameter: parameter.into(),
            source: source.into(),
        });
        self
    }

    /// Sets an external failure threshold for `variable`.
    #[inline]
    pub fn failure_threshold(mut self, variable: impl Into<String>, threshold: f64) -> Self {
        self.failure_thresholds.insert(variable.into(), threshold);
        self
    }

    /// Adds a named output metric.
    #[inline]
    pub fn output_metric(mut self, metric: impl Into<String>) -> Self {
        self.output_metrics.push(metric.into());
        self
    }

    /// Builds and validates the scenario.
    pub fn build(self) -> Result<ScenarioConfig, ScenarioError> {
        let n = self.variables.len();
        let config = ScenarioConfig {
            name: self.name,
            variables: self.variables,
            correlation_matrix: self
                .correlation
                .unwrap_or_else(|| CorrelationMatrix::identity(n)),
            features: self.features,
            copula: self.copula,
            time_series: self.time_series,
            data_bindings: self.data_bindings,
            failure_thresholds: self.failure_thresholds,
            output_metrics: self.output_metrics,
        };
        validate_scenario(&config)?;
        Ok(config)
    }
}
