//! Value-at-Risk, Conditional VaR and failure probabilities.
//!
//! Larger sample values are treated as worse outcomes, so every VaR here is
//! an upper-tail quantile and CVaR averages the samples at or above it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sim_core::math::SortedSamples;
use sim_core::SampleMatrix;
use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::{check_thresholds, ensure_non_empty, threshold_at};

/// Percentile used as the failure threshold when none is supplied.
pub const DEFAULT_FAILURE_PERCENTILE: f64 = 95.0;

/// Where a variable's failure threshold came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdSource {
    /// The variable's own 95th percentile
    #[serde(rename = "sample_p95")]
    SampleP95,
    /// Supplied by the scenario
    #[serde(rename = "external")]
    External,
}

/// Resolves the failure threshold of one variable.
pub(crate) fn resolve_threshold(
    sorted: &SortedSamples,
    external: Option<f64>,
) -> (f64, ThresholdSource) {
    match external {
        Some(t) => (t, ThresholdSource::External),
        None => (
            sorted.percentile(DEFAULT_FAILURE_PERCENTILE),
            ThresholdSource::SampleP95,
        ),
    }
}

/// Tail-risk measures of one variable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableRiskMetrics {
    /// 95th percentile
    pub var_95: f64,
    /// 99th percentile
    pub var_99: f64,
    /// Mean of the samples at or above `var_95`
    pub cvar_95: f64,
    /// Mean of the samples at or above `var_99`
    pub cvar_99: f64,
    /// Confidence level of the two fields below
    pub confidence_level: f64,
    /// VaR at `confidence_level`
    pub var_at_confidence: f64,
    /// CVaR at `confidence_level`
    pub cvar_at_confidence: f64,
    /// Fraction of samples strictly above `failure_threshold`
    pub probability_of_failure: f64,
    /// Mean excess above `failure_threshold`, zero for samples below it
    pub risk_exposure: f64,
    /// Worst observed sample
    pub impact_assessment: f64,
    /// Threshold the failure measures were taken against
    pub failure_threshold: f64,
    /// Origin of `failure_threshold`
    pub threshold_source: ThresholdSource,
}

impl VariableRiskMetrics {
    /// Computes the metrics of one column.
    ///
    /// `confidence_level` must already be validated.
    pub fn from_values(values: &[f64], confidence_level: f64, threshold: Option<f64>) -> Self {
        let sorted = SortedSamples::new(values);
        Self::from_sorted(&sorted, confidence_level, threshold)
    }

    pub(crate) fn from_sorted(
        sorted: &SortedSamples,
        confidence_level: f64,
        threshold: Option<f64>,
    ) -> Self {
        let var_95 = sorted.percentile(95.0);
        let var_99 = sorted.percentile(99.0);
        let var_at_confidence = sorted.quantile(confidence_level);
        let (failure_threshold, threshold_source) = resolve_threshold(sorted, threshold);

        let values = sorted.as_slice();
        let risk_exposure = values
            .iter()
            .map(|v| (v - failure_threshold).max(0.0))
            .sum::<f64>()
            / values.len().max(1) as f64;

        Self {
            var_95,
            var_99,
            cvar_95: sorted.tail_mean(var_95),
            cvar_99: sorted.tail_mean(var_99),
            confidence_level,
            var_at_confidence,
            cvar_at_confidence: sorted.tail_mean(var_at_confidence),
            probability_of_failure: sorted.exceedance(failure_threshold),
            risk_exposure,
            impact_assessment: sorted.max(),
            failure_threshold,
            threshold_source,
        }
    }
}

/// Checks that a confidence level lies strictly inside `(0, 1)`.
pub fn validate_confidence(confidence_level: f64) -> Result<(), AnalysisError> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfidence(confidence_level))
    }
}

/// Per-variable risk metrics, keyed by column name.
///
/// `thresholds` holds one optional external failure threshold per column,
/// or is empty. Variables without one fall back to their own 95th
/// percentile and report [`ThresholdSource::SampleP95`].
///
/// # Errors
///
/// - [`AnalysisError::InvalidConfidence`] unless `0 < confidence_level < 1`
/// - [`AnalysisError::ThresholdCount`] if `thresholds` has the wrong length
/// - [`AnalysisError::EmptySamples`] for an empty matrix
pub fn calculate_risk_metrics(
    samples: &SampleMatrix,
    confidence_level: f64,
    thresholds: &[Option<f64>],
) -> Result<BTreeMap<String, VariableRiskMetrics>, AnalysisError> {
    validate_confidence(confidence_level)?;
    ensure_non_empty(samples)?;
    check_thresholds(samples, thresholds)?;

    let metrics: Vec<VariableRiskMetrics> = samples
        .columns()
        .par_iter()
        .enumerate()
        .map(|(j, column)| {
            VariableRiskMetrics::from_values(column, confidence_level, threshold_at(thresholds, j))
        })
        .collect();

    Ok(samples.names().iter().cloned().zip(metrics).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn one_to_hundred() -> Vec<f64> {
        (1..=100).map(f64::from).collect()
    }

    // ==========================================
    // VaR / CVaR
    // ==========================================

    #[test]
    fn test_var_and_cvar_on_ramp() {
        let m = VariableRiskMetrics::from_values(&one_to_hundred(), 0.9, None);
        // idx = 0.95 * 99 = 94.05
        assert_relative_eq!(m.var_95, 95.05, epsilon = 1e-9);
        assert_relative_eq!(m.var_99, 99.01, epsilon = 1e-9);
        // values 96..=100
        assert_relative_eq!(m.cvar_95, 98.0, epsilon = 1e-12);
        assert_eq!(m.cvar_99, 100.0);
        assert_relative_eq!(m.var_at_confidence, 90.1, epsilon = 1e-9);
        assert_eq!(m.impact_assessment, 100.0);
    }

    #[test]
    fn test_constant_column() {
        let m = VariableRiskMetrics::from_values(&[3.0; 20], 0.95, None);
        assert_eq!(m.var_95, 3.0);
        assert_eq!(m.cvar_99, 3.0);
        assert_eq!(m.probability_of_failure, 0.0);
        assert_eq!(m.risk_exposure, 0.0);
    }

    // ==========================================
    // Failure thresholds
    // ==========================================

    #[test]
    fn test_sample_threshold_default() {
        let m = VariableRiskMetrics::from_values(&one_to_hundred(), 0.95, None);
        assert_eq!(m.threshold_source, ThresholdSource::SampleP95);
        assert_relative_eq!(m.failure_threshold, 95.05, epsilon = 1e-9);
        assert_relative_eq!(m.probability_of_failure, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_external_threshold() {
        let m = VariableRiskMetrics::from_values(&one_to_hundred(), 0.95, Some(90.0));
        assert_eq!(m.threshold_source, ThresholdSource::External);
        assert_eq!(m.failure_threshold, 90.0);
        // 91..=100 strictly above
        assert_relative_eq!(m.probability_of_failure, 0.10, epsilon = 1e-12);
        // (1 + 2 + ... + 10) / 100
        assert_relative_eq!(m.risk_exposure, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_thresholds_by_position() {
        let samples = SampleMatrix::from_unnamed_columns(vec![one_to_hundred(), one_to_hundred()])
            .unwrap();
        let metrics = calculate_risk_metrics(&samples, 0.95, &[None, Some(50.0)]).unwrap();
        assert_eq!(metrics["variable_0"].threshold_source, ThresholdSource::SampleP95);
        assert_eq!(metrics["variable_1"].failure_threshold, 50.0);
        assert_relative_eq!(metrics["variable_1"].probability_of_failure, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let samples = SampleMatrix::from_unnamed_columns(vec![one_to_hundred()]).unwrap();
        assert_eq!(
            calculate_risk_metrics(&samples, 1.0, &[]),
            Err(AnalysisError::InvalidConfidence(1.0))
        );
        assert_eq!(
            calculate_risk_metrics(&samples, 0.95, &[None, None]),
            Err(AnalysisError::ThresholdCount { expected: 1, got: 2 })
        );
    }

    #[test]
    fn test_threshold_source_serde() {
        assert_eq!(
            serde_json::to_string(&ThresholdSource::SampleP95).unwrap(),
            "\"sample_p95\""
        );
    }

    // ==========================================
    // Properties
    // ==========================================

    proptest! {
        #[test]
        fn prop_cvar_dominates_var(
            values in prop::collection::vec(-1e6f64..1e6, 1..400),
            confidence in 0.5f64..0.999,
        ) {
            let m = VariableRiskMetrics::from_values(&values, confidence, None);
            prop_assert!(m.cvar_95 >= m.var_95);
            prop_assert!(m.cvar_99 >= m.var_99);
            prop_assert!(m.cvar_at_confidence >= m.var_at_confidence);
            prop_assert!(m.var_99 >= m.var_95);
            prop_assert!((0.0..=1.0).contains(&m.probability_of_failure));
        }
    }
}
