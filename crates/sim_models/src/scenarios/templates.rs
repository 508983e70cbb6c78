//! Preset scenario templates.
//!
//! Provides ready-to-use scenarios for common strategic-risk studies:
//! - Enterprise risk assessment (operational, market, credit)
//! - Project planning (duration, cost overrun, resourcing, scope)
//! - Supply chain, technology, environmental and compliance risk

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::{validate_scenario, FeatureFlags, ScenarioConfig};
use super::error::ScenarioError;
use super::time_series::generate_time_series_scenario;
use crate::correlation::{Copula, CorrelationMatrix};
use crate::distributions::{Distribution, VariableDefinition};

/// Types of preset scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTemplate {
    /// Operational, market and credit risk
    RiskAssessment,
    /// Task duration, cost overrun, resource availability and scope change
    ProjectPlanning,
    /// Demand, lead time, supplier reliability and transport cost
    SupplyChain,
    /// Failure rates, cyber incidents, obsolescence and integration effort
    TechnologyRisk,
    /// Climate anomaly, extreme weather, regulatory cost and scarcity
    Environmental,
    /// Regulatory change, audit findings, penalties and compliance score
    Compliance,
}

impl ScenarioTemplate {
    /// Every template.
    pub const ALL: [ScenarioTemplate; 6] = [
        Self::RiskAssessment,
        Self::ProjectPlanning,
        Self::SupplyChain,
        Self::TechnologyRisk,
        Self::Environmental,
        Self::Compliance,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RiskAssessment => "risk_assessment",
            Self::ProjectPlanning => "project_planning",
            Self::SupplyChain => "supply_chain",
            Self::TechnologyRisk => "technology_risk",
            Self::Environmental => "environmental",
            Self::Compliance => "compliance",
        }
    }

    /// Get scenario description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RiskAssessment => "Enterprise risk across operational, market and credit exposures",
            Self::ProjectPlanning => "Schedule and budget uncertainty for project delivery",
            Self::SupplyChain => "Demand and supplier disruption across the supply chain",
            Self::TechnologyRisk => "System failures, cyber incidents and technical debt",
            Self::Environmental => "Climate-related physical and transition risk",
            Self::Compliance => "Regulatory change, audit outcomes and penalty exposure",
        }
    }

    /// Default variables in column order.
    pub fn variables(&self) -> Vec<VariableDefinition> {
        use Distribution::*;
        let vars: Vec<(&str, Distribution)> = match self {
            Self::RiskAssessment => vec![
                ("operational_risk", Beta { alpha: 2.0, beta: 5.0 }),
                ("market_risk", Normal { mean: 0.0, std: 0.15 }),
                ("credit_risk", Gamma { shape: 2.0, scale: 0.05 }),
            ],
            Self::ProjectPlanning => vec![
                ("task_duration", Lognormal { mean: 3.0, std: 0.25 }),
                ("cost_overrun", Normal { mean: 0.1, std: 0.05 }),
                ("resource_availability", Beta { alpha: 8.0, beta: 2.0 }),
                ("scope_change", Poisson { lambda: 2.0 }),
            ],
            Self::SupplyChain => vec![
                ("demand", Normal { mean: 1000.0, std: 150.0 }),
                ("lead_time", Gamma { shape: 4.0, scale: 2.5 }),
                ("supplier_reliability", Beta { alpha: 9.0, beta: 1.0 }),
                ("transport_cost", Lognormal { mean: 4.0, std: 0.2 }),
            ],
            Self::TechnologyRisk => vec![
                ("system_failure_rate", Exponential { scale: 0.02 }),
                ("cyber_incidents", Poisson { lambda: 3.0 }),
                ("obsolescence_years", Weibull { shape: 1.5, scale: 5.0 }),
                ("integration_complexity", Uniform { low: 1.0, high: 10.0 }),
            ],
            Self::Environmental => vec![
                ("temperature_anomaly", Normal { mean: 1.2, std: 0.4 }),
                ("extreme_weather_events", Poisson { lambda: 4.0 }),
                ("regulatory_cost", Lognormal { mean: 2.5, std: 0.5 }),
                ("resource_scarcity", Beta { alpha: 2.0, beta: 3.0 }),
            ],
            Self::Compliance => vec![
                ("regulatory_changes", Poisson { lambda: 5.0 }),
                ("audit_findings", Poisson { lambda: 2.0 }),
                ("penalty_cost", Lognormal { mean: 10.0, std: 1.0 }),
                ("compliance_score", Beta { alpha: 8.0, beta: 2.0 }),
            ],
        };
        vars.into_iter()
            .map(|(name, dist)| VariableDefinition::new(name, dist))
            .collect()
    }

    /// Default correlation rows.
    pub fn correlation_rows(&self) -> Vec<Vec<f64>> {
        match self {
            Self::RiskAssessment => vec![
                vec![1.0, 0.3, 0.2],
                vec![0.3, 1.0, 0.4],
                vec![0.2, 0.4, 1.0],
            ],
            Self::ProjectPlanning => vec![
                vec![1.0, 0.6, -0.4, 0.5],
                vec![0.6, 1.0, -0.3, 0.4],
                vec![-0.4, -0.3, 1.0, -0.2],
                vec![0.5, 0.4, -0.2, 1.0],
            ],
            Self::SupplyChain => vec![
                vec![1.0, 0.3, -0.2, 0.4],
                vec![0.3, 1.0, -0.5, 0.3],
                vec![-0.2, -0.5, 1.0, -0.2],
                vec![0.4, 0.3, -0.2, 1.0],
            ],
            Self::TechnologyRisk => vec![
                vec![1.0, 0.4, -0.3, 0.5],
                vec![0.4, 1.0, -0.2, 0.3],
                vec![-0.3, -0.2, 1.0, -0.2],
                vec![0.5, 0.3, -0.2, 1.0],
            ],
            Self::Environmental => vec![
                vec![1.0, 0.7, 0.4, 0.5],
                vec![0.7, 1.0, 0.3, 0.4],
                vec![0.4, 0.3, 1.0, 0.3],
                vec![0.5, 0.4, 0.3, 1.0],
            ],
            Self::Compliance => vec![
                vec![1.0, 0.5, 0.4, -0.3],
                vec![0.5, 1.0, 0.6, -0.5],
                vec![0.4, 0.6, 1.0, -0.4],
                vec![-0.3, -0.5, -0.4, 1.0],
            ],
        }
    }

    /// Named output metrics reported by the template.
    pub fn output_metrics(&self) -> Vec<String> {
        let metrics: &[&str] = match self {
            Self::RiskAssessment => &["total_risk_exposure", "value_at_risk", "expected_shortfall"],
            Self::ProjectPlanning => &["completion_time", "total_cost", "schedule_confidence"],
            Self::SupplyChain => &["service_level", "inventory_cost", "stockout_probability"],
            Self::TechnologyRisk => &["system_availability", "incident_cost", "technical_debt"],
            Self::Environmental => &["physical_risk", "transition_cost", "adaptation_need"],
            Self::Compliance => &["expected_penalties", "compliance_gap", "audit_exposure"],
        };
        metrics.iter().map(|m| m.to_string()).collect()
    }
}

impl fmt::Display for ScenarioTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioTemplate {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == needle)
            .ok_or_else(|| ScenarioError::UnknownScenarioTemplate(s.to_string()))
    }
}

/// Replacements applied on top of a template's defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOverrides {
    /// Replacement distributions by variable name
    pub distributions: BTreeMap<String, Distribution>,
    /// Replacement correlation matrix
    pub correlation_matrix: Option<CorrelationMatrix>,
    /// Replacement feature flags
    pub features: Option<FeatureFlags>,
    /// Replacement copula
    pub copula: Option<Copula>,
    /// External failure thresholds by variable name
    pub failure_thresholds: BTreeMap<String, f64>,
}

impl TemplateOverrides {
    /// Replaces the distribution of `variable`.
    pub fn with_distribution(mut self, variable: impl Into<String>, distribution: Distribution) -> Self {
        self.distributions.insert(variable.into(), distribution);
        self
    }

    /// Replaces the correlation matrix.
    pub fn with_correlation(mut self, matrix: CorrelationMatrix) -> Self {
        self.correlation_matrix = Some(matrix);
        self
    }

    /// Replaces the feature flags.
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }
}

/// Builds a scenario from a template.
///
/// Overrides replace per-variable distributions, the correlation matrix,
/// the feature flags or the copula. `time_horizon` attaches default
/// time-series parameters for every variable.
///
/// # Errors
///
/// - [`ScenarioError::UnknownVariable`] if an override or threshold names a
///   variable the template does not declare
/// - Any [`validate_scenario`] failure of the assembled configuration
pub fn generate_scenario(
    template: ScenarioTemplate,
    overrides: &TemplateOverrides,
    time_horizon: Option<usize>,
) -> Result<ScenarioConfig, ScenarioError> {
    let mut variables = template.variables();

    for (name, dist) in &overrides.distributions {
        let var = variables
            .iter_mut()
            .find(|v| &v.name == name)
            .ok_or_else(|| ScenarioError::UnknownVariable(name.clone()))?;
        var.distribution = *dist;
    }

    if let Some(unknown) = overrides
        .failure_thresholds
        .keys()
        .find(|name| !variables.iter().any(|v| &v.name == *name))
    {
        return Err(ScenarioError::UnknownVariable(unknown.clone()));
    }

    let correlation_matrix = match &overrides.correlation_matrix {
        Some(matrix) => matrix.clone(),
        None => CorrelationMatrix::from_rows(&template.correlation_rows())?,
    };

    let config = ScenarioConfig {
        name: template.name().to_string(),
        variables,
        correlation_matrix,
        features: overrides.features.unwrap_or_default(),
        copula: overrides.copula.unwrap_or_default(),
        time_series: None,
        data_bindings: Vec::new(),
        failure_thresholds: overrides.failure_thresholds.clone(),
        output_metrics: template.output_metrics(),
    };

    let config = match time_horizon {
        Some(steps) => generate_time_series_scenario(&config, steps)?,
        None => config,
    };

    validate_scenario(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::validate_correlation_matrix;

    #[test]
    fn test_all_templates_generate_valid_scenarios() {
        for template in ScenarioTemplate::ALL {
            let config = generate_scenario(template, &TemplateOverrides::default(), None).unwrap();
            assert_eq!(config.name, template.name());
            assert_eq!(config.correlation_matrix.dim(), config.variables.len());
            assert!(validate_correlation_matrix(&template.correlation_rows()));
            assert_eq!(config.output_metrics.len(), 3);
        }
    }

    #[test]
    fn test_risk_assessment_shape() {
        let config =
            generate_scenario(ScenarioTemplate::RiskAssessment, &TemplateOverrides::default(), None)
                .unwrap();
        assert_eq!(
            config.variable_names(),
            vec!["operational_risk", "market_risk", "credit_risk"]
        );
        for i in 0..3 {
            assert_eq!(config.correlation_matrix.get(i, i), 1.0);
        }
    }

    #[test]
    fn test_template_from_str() {
        assert_eq!(
            "Supply_Chain".parse::<ScenarioTemplate>().unwrap(),
            ScenarioTemplate::SupplyChain
        );
        assert_eq!(
            "weather".parse::<ScenarioTemplate>().unwrap_err(),
            ScenarioError::UnknownScenarioTemplate("weather".to_string())
        );
        for t in ScenarioTemplate::ALL {
            assert_eq!(t.to_string().parse::<ScenarioTemplate>().unwrap(), t);
            assert!(!t.description().is_empty());
        }
    }

    #[test]
    fn test_overrides_replace_distribution() {
        let overrides = TemplateOverrides::default()
            .with_distribution("market_risk", Distribution::Normal { mean: 0.0, std: 0.3 });
        let config = generate_scenario(ScenarioTemplate::RiskAssessment, &overrides, None).unwrap();
        assert_eq!(
            config.variables[1].distribution,
            Distribution::Normal { mean: 0.0, std: 0.3 }
        );
    }

    #[test]
    fn test_override_unknown_variable() {
        let overrides = TemplateOverrides::default()
            .with_distribution("fx_risk", Distribution::Normal { mean: 0.0, std: 0.3 });
        assert_eq!(
            generate_scenario(ScenarioTemplate::RiskAssessment, &overrides, None).unwrap_err(),
            ScenarioError::UnknownVariable("fx_risk".to_string())
        );
    }

    #[test]
    fn test_override_correlation_size_mismatch() {
        let overrides = TemplateOverrides::default().with_correlation(CorrelationMatrix::identity(2));
        let err = generate_scenario(ScenarioTemplate::RiskAssessment, &overrides, None).unwrap_err();
        assert!(matches!(err, ScenarioError::Validation(_)));
    }

    #[test]
    fn test_override_features() {
        let overrides = TemplateOverrides::default().with_features(FeatureFlags::none());
        let config = generate_scenario(ScenarioTemplate::Compliance, &overrides, None).unwrap();
        assert_eq!(config.features, FeatureFlags::none());
    }

    #[test]
    fn test_time_horizon_attaches_parameters() {
        let config =
            generate_scenario(ScenarioTemplate::SupplyChain, &TemplateOverrides::default(), Some(12))
                .unwrap();
        let ts = config.time_series.unwrap();
        assert_eq!(ts.time_steps, 12);
        assert_eq!(ts.parameters.len(), 4);
    }
}
