//! Time-series augmentation of scenarios.

use super::config::{validate_scenario, ScenarioConfig, TimeSeriesParams, TimeSeriesSpec};
use super::error::ScenarioError;

/// Returns a copy of `base` with a time-series projection of `time_steps`.
///
/// Variables that already carry time-series parameters keep them; every
/// other variable gets [`TimeSeriesParams::default`].
///
/// ```
/// use sim_models::scenarios::{
///     generate_scenario, generate_time_series_scenario, ScenarioTemplate, TemplateOverrides,
/// };
///
/// let base = generate_scenario(ScenarioTemplate::RiskAssessment, &TemplateOverrides::default(), None)
///     .unwrap();
/// let ts = generate_time_series_scenario(&base, 24).unwrap();
/// let spec = ts.time_series.unwrap();
/// assert_eq!(spec.time_steps, 24);
/// assert_eq!(spec.parameters["market_risk"].volatility_decay, 0.95);
/// ```
///
/// # Errors
///
/// [`ScenarioError::Validation`] if `time_steps` is zero or above
/// [`MAX_TIME_STEPS`](super::MAX_TIME_STEPS), or the augmented
/// configuration is invalid.
pub fn generate_time_series_scenario(
    base: &ScenarioConfig,
    time_steps: usize,
) -> Result<ScenarioConfig, ScenarioError> {
    if time_steps == 0 {
        return Err(ScenarioError::validation("time_steps must be at least 1"));
    }

    let mut config = base.clone();
    let mut parameters = base
        .time_series
        .as_ref()
        .map(|ts| ts.parameters.clone())
        .unwrap_or_default();

    for var in &config.variables {
        parameters.entry(var.name.clone()).or_default();
    }

    config.time_series = Some(TimeSeriesSpec {
        time_steps,
        parameters,
    });
    validate_scenario(&config)?;
    Ok(config)
}

impl ScenarioConfig {
    /// Time-series parameters for every variable, in column order.
    ///
    /// Variables without explicit parameters get the defaults.
    pub fn time_series_params(&self) -> Vec<TimeSeriesParams> {
        self.variables
            .iter()
            .map(|v| {
                self.time_series
                    .as_ref()
                    .and_then(|ts| ts.parameters.get(&v.name).copied())
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::Distribution;

    fn base() -> ScenarioConfig {
        ScenarioConfig::builder("ts")
            .variable("a", Distribution::Normal { mean: 0.0, std: 1.0 })
            .variable("b", Distribution::Exponential { scale: 1.0 })
            .build()
            .unwrap()
    }

    #[test]
    fn test_adds_defaults_for_every_variable() {
        let c = generate_time_series_scenario(&base(), 5).unwrap();
        let ts = c.time_series.as_ref().unwrap();
        assert_eq!(ts.parameters.len(), 2);
        assert_eq!(ts.parameters["b"], TimeSeriesParams::default());
        assert_eq!(c.time_series_params().len(), 2);
    }

    #[test]
    fn test_preserves_existing_parameters() {
        let custom = TimeSeriesParams {
            volatility_decay: 0.8,
            mean_reversion: 0.5,
        };
        let mut cfg = base();
        let mut parameters = std::collections::BTreeMap::new();
        parameters.insert("a".to_string(), custom);
        cfg.time_series = Some(TimeSeriesSpec {
            time_steps: 3,
            parameters,
        });

        let c = generate_time_series_scenario(&cfg, 10).unwrap();
        let ts = c.time_series.unwrap();
        assert_eq!(ts.time_steps, 10);
        assert_eq!(ts.parameters["a"], custom);
        assert_eq!(ts.parameters["b"], TimeSeriesParams::default());
    }

    #[test]
    fn test_rejects_unbounded_steps() {
        assert!(matches!(
            generate_time_series_scenario(&base(), usize::MAX),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_zero_steps() {
        assert!(matches!(
            generate_time_series_scenario(&base(), 0),
            Err(ScenarioError::Validation(_))
        ));
    }
}
