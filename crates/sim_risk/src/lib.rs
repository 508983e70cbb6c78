//! # sim_risk (L3: Result Analyzer)
//!
//! Turns a simulated [`SampleMatrix`](sim_core::SampleMatrix) into risk
//! analytics.
//!
//! This crate provides:
//! - Descriptive statistics per variable (`statistics`)
//! - Value-at-Risk, Conditional VaR and failure probabilities (`risk_metrics`)
//! - Severity-level failure analysis with trend detection (`failure_modes`)
//! - Composite risk scoring and priority buckets (`prioritization`)
//! - Five canned stress transformations (`stress`)
//! - Correlation and tornado sensitivity against the aggregate output
//!   (`sensitivity`)
//! - An executive summary with recommendations (`summary`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              sim_risk (L3)              │
//! ├─────────────────────────────────────────┤
//! │  statistics/      - moments, quantiles  │
//! │  risk_metrics/    - VaR, CVaR, PoF      │
//! │  failure_modes/   - severities, trend   │
//! │  prioritization/  - scores, buckets     │
//! │  stress/          - stress scenarios    │
//! │  sensitivity/     - tornado, rank corr  │
//! │  summary/         - executive report    │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │              sim_core (L1)              │
//! │  SampleMatrix, statistics kernels, RNG  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Per-variable work runs on the ambient rayon pool, so callers that
//! `install` a bounded pool keep the analysis inside it.
//!
//! ## Conventions
//!
//! - Percentiles interpolate linearly between closest ranks
//! - Moments are population moments; kurtosis is excess kurtosis
//! - VaR is an upper-tail quantile: larger values are worse
//! - Failure thresholds are passed positionally, one optional value per
//!   column; an empty slice means "use each variable's own 95th percentile"
//!
//! ## Example
//!
//! ```
//! use sim_core::SampleMatrix;
//! use sim_risk::{calculate_risk_metrics, calculate_statistics};
//!
//! let column: Vec<f64> = (1..=100).map(f64::from).collect();
//! let samples = SampleMatrix::from_unnamed_columns(vec![column]).unwrap();
//!
//! let stats = calculate_statistics(&samples).unwrap();
//! assert_eq!(stats["variable_0"].mean, 50.5);
//!
//! let metrics = calculate_risk_metrics(&samples, 0.95, &[]).unwrap();
//! assert!(metrics["variable_0"].cvar_95 >= metrics["variable_0"].var_95);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod failure_modes;
pub mod level;
pub mod prioritization;
pub mod risk_metrics;
pub mod sensitivity;
pub mod statistics;
pub mod stress;
pub mod summary;

pub use error::AnalysisError;
pub use failure_modes::{calculate_failure_modes, FailureModes};
pub use level::RiskLevel;
pub use prioritization::{prioritize_risks, RiskPrioritization};
pub use risk_metrics::{calculate_risk_metrics, ThresholdSource, VariableRiskMetrics};
pub use sensitivity::{perform_sensitivity_analysis, SensitivityReport};
pub use statistics::{calculate_statistics, VariableStatistics};
pub use stress::{
    perform_stress_tests, StressTestConfig, StressTestKind, StressTestOutcome, StressTestReport,
    VariableStress,
};
pub use summary::{generate_summary_report, SummaryReport};

use sim_core::SampleMatrix;

/// Rejects a matrix with no rows or columns.
pub(crate) fn ensure_non_empty(samples: &SampleMatrix) -> Result<(), AnalysisError> {
    if samples.n_rows() == 0 || samples.n_cols() == 0 {
        Err(AnalysisError::EmptySamples)
    } else {
        Ok(())
    }
}

/// Checks that `thresholds` is empty or holds one entry per column.
///
/// # Errors
///
/// [`AnalysisError::ThresholdCount`] if `thresholds` is neither empty nor
/// one entry per column.
pub(crate) fn check_thresholds(
    samples: &SampleMatrix,
    thresholds: &[Option<f64>],
) -> Result<(), AnalysisError> {
    if thresholds.is_empty() || thresholds.len() == samples.n_cols() {
        Ok(())
    } else {
        Err(AnalysisError::ThresholdCount {
            expected: samples.n_cols(),
            got: thresholds.len(),
        })
    }
}

/// External threshold of column `j`, if any.
#[inline]
pub(crate) fn threshold_at(thresholds: &[Option<f64>], j: usize) -> Option<f64> {
    thresholds.get(j).copied().flatten()
}
