//! End-to-end analysis of sampled scenarios.

use approx::assert_relative_eq;
use proptest::prelude::*;
use sim_core::rng::SimRng;
use sim_core::SampleMatrix;
use sim_models::correlation::{generate_correlated_samples, Copula};
use sim_models::distributions::{sample_variables, Distribution, VariableDefinition};
use sim_models::scenarios::{generate_scenario, ScenarioTemplate, TemplateOverrides};
use sim_risk::stress::StressTestKind;
use sim_risk::{
    calculate_failure_modes, calculate_risk_metrics, calculate_statistics, generate_summary_report,
    perform_sensitivity_analysis, perform_stress_tests, prioritize_risks, StressTestConfig,
};

fn sample(distribution: Distribution, n: usize, seed: u64) -> SampleMatrix {
    let vars = vec![VariableDefinition::new("x", distribution)];
    sample_variables(&vars, n, &mut SimRng::from_seed(seed)).unwrap()
}

#[test]
fn test_normal_var_matches_closed_form() {
    let samples = sample(Distribution::Normal { mean: 100.0, std: 15.0 }, 200_000, 42);
    let stats = calculate_statistics(&samples).unwrap();
    let metrics = calculate_risk_metrics(&samples, 0.95, &[]).unwrap();

    assert_relative_eq!(stats["x"].mean, 100.0, epsilon = 0.2);
    assert_relative_eq!(stats["x"].std, 15.0, epsilon = 0.2);
    assert_relative_eq!(stats["x"].skewness, 0.0, epsilon = 0.03);
    assert_relative_eq!(stats["x"].kurtosis, 0.0, epsilon = 0.06);
    // 100 + 1.6449 * 15 and 100 + 2.3263 * 15
    assert_relative_eq!(metrics["x"].var_95, 124.67, epsilon = 0.3);
    assert_relative_eq!(metrics["x"].var_99, 134.89, epsilon = 0.5);
    // 100 + 15 * φ(1.6449) / 0.05
    assert_relative_eq!(metrics["x"].cvar_95, 130.94, epsilon = 0.5);
}

#[test]
fn test_template_scenario_full_analysis() {
    let config =
        generate_scenario(ScenarioTemplate::RiskAssessment, &TemplateOverrides::default(), None)
            .unwrap();
    let samples = generate_correlated_samples(
        &config.variables,
        &config.correlation_matrix,
        20_000,
        &Copula::Gaussian,
        &mut SimRng::from_seed(9),
    )
    .unwrap();
    let thresholds = config.thresholds_by_index();

    let stats = calculate_statistics(&samples).unwrap();
    let metrics = calculate_risk_metrics(&samples, 0.95, &thresholds).unwrap();
    let failures = calculate_failure_modes(&samples).unwrap();
    let priorities = prioritize_risks(&samples, &thresholds).unwrap();
    let stress = perform_stress_tests(&samples, &StressTestConfig::with_seed(1)).unwrap();
    let sensitivity = perform_sensitivity_analysis(&samples).unwrap();
    let summary = generate_summary_report(&samples, &thresholds).unwrap();

    for name in &config.variable_names() {
        assert!(stats.contains_key(name));
        assert!(metrics[name].cvar_95 >= metrics[name].var_95);
        assert!(failures[name].trend.is_some());
    }
    assert_eq!(priorities.ranking.len(), 3);
    assert_eq!(priorities.critical.len(), 1);
    assert_eq!(stress.tests.len(), 5);
    assert_relative_eq!(
        stress.outcome(StressTestKind::ExtremeMarket).unwrap().impact,
        1.0,
        epsilon = 1e-12
    );
    assert_eq!(sensitivity.variables.len(), 3);
    assert_eq!(summary.variable_count, 3);
    assert_eq!(
        summary.highest_priority_risk.as_deref(),
        priorities.top().map(|s| s.variable.as_str())
    );
}

#[test]
fn test_results_serialise() {
    let samples = sample(Distribution::Gamma { shape: 2.0, scale: 1.0 }, 1_000, 3);
    let metrics = calculate_risk_metrics(&samples, 0.99, &[Some(4.0)]).unwrap();
    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["x"]["threshold_source"], "external");
    assert_eq!(json["x"]["confidence_level"], 0.99);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_cvar_at_least_var_for_skewed_marginals(seed in any::<u64>(), pick in 0usize..3) {
        let distribution = [
            Distribution::Normal { mean: 0.0, std: 1.0 },
            Distribution::Lognormal { mean: 0.0, std: 0.75 },
            Distribution::Gamma { shape: 0.8, scale: 2.0 },
        ][pick];
        let samples = sample(distribution, 2_000, seed);
        let metrics = calculate_risk_metrics(&samples, 0.975, &[]).unwrap();
        let m = &metrics["x"];
        prop_assert!(m.cvar_95 >= m.var_95);
        prop_assert!(m.cvar_99 >= m.var_99);
        prop_assert!(m.cvar_at_confidence >= m.var_at_confidence);
    }
}
