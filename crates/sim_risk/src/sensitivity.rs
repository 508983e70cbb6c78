//! Sensitivity of the aggregate output to each input variable.

use serde::{Deserialize, Serialize};
use sim_core::math::{mean, pearson, spearman, std_dev};
use sim_core::SampleMatrix;

use crate::ensure_non_empty;
use crate::error::AnalysisError;

/// Fraction of rows in each tornado tail.
pub const TORNADO_DECILE: f64 = 0.1;

/// Influence of one variable on the output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableSensitivity {
    /// Column name
    pub variable: String,
    /// Linear correlation with the output
    pub pearson: f64,
    /// Rank correlation with the output
    pub spearman: f64,
    /// Mean output over the variable's top decile minus its bottom decile
    pub tornado_swing: f64,
    /// 1-based rank by `|spearman|`
    pub rank: usize,
}

/// Sensitivity of the row-sum output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    /// Mean of the aggregate output
    pub output_mean: f64,
    /// Standard deviation of the aggregate output
    pub output_std: f64,
    /// Variables, most influential first
    pub variables: Vec<VariableSensitivity>,
}

impl SensitivityReport {
    /// The most influential variable.
    pub fn most_influential(&self) -> Option<&VariableSensitivity> {
        self.variables.first()
    }
}

/// Mean output over the lowest and highest `TORNADO_DECILE` of `input`.
fn tornado_swing(input: &[f64], output: &[f64]) -> f64 {
    let n = input.len();
    let k = ((n as f64 * TORNADO_DECILE).floor() as usize).max(1).min(n);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| input[a].total_cmp(&input[b]));

    let tail_mean = |idx: &[usize]| mean(&idx.iter().map(|&i| output[i]).collect::<Vec<_>>());
    tail_mean(&order[n - k..]) - tail_mean(&order[..k])
}

/// Correlation and tornado sensitivity of each variable against the row sum.
///
/// Variables are ranked by `|spearman|`, descending; ties keep column
/// order.
///
/// # Errors
///
/// [`AnalysisError::EmptySamples`] for an empty matrix.
pub fn perform_sensitivity_analysis(
    samples: &SampleMatrix,
) -> Result<SensitivityReport, AnalysisError> {
    ensure_non_empty(samples)?;

    let output = samples.row_sums();
    let mut variables: Vec<VariableSensitivity> = samples
        .names()
        .iter()
        .zip(samples.columns())
        .map(|(name, column)| VariableSensitivity {
            variable: name.clone(),
            pearson: pearson(column, &output),
            spearman: spearman(column, &output),
            tornado_swing: tornado_swing(column, &output),
            rank: 0,
        })
        .collect();

    variables.sort_by(|a, b| b.spearman.abs().total_cmp(&a.spearman.abs()));
    for (i, v) in variables.iter_mut().enumerate() {
        v.rank = i + 1;
    }

    Ok(SensitivityReport {
        output_mean: mean(&output),
        output_std: std_dev(&output),
        variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_core::rng::SimRng;

    // ==========================================
    // Ranking
    // ==========================================

    #[test]
    fn test_dominant_variable_ranks_first() {
        let mut rng = SimRng::from_seed(17);
        let n = 5_000;
        let mut small = vec![0.0; n];
        let mut large = vec![0.0; n];
        rng.fill_normal(&mut small);
        rng.fill_normal(&mut large);
        let large: Vec<f64> = large.iter().map(|v| 20.0 * v).collect();

        let samples = SampleMatrix::from_columns(
            vec!["small".to_string(), "large".to_string()],
            vec![small, large],
        )
        .unwrap();
        let report = perform_sensitivity_analysis(&samples).unwrap();

        let top = report.most_influential().unwrap();
        assert_eq!(top.variable, "large");
        assert_eq!(top.rank, 1);
        assert!(top.spearman > 0.95);
        assert!(report.variables[1].spearman.abs() < 0.2);
        assert!(top.tornado_swing > report.variables[1].tornado_swing);
    }

    #[test]
    fn test_tornado_swing_on_identity() {
        let x: Vec<f64> = (0..100).map(f64::from).collect();
        // top decile 90..=99 mean 94.5, bottom 0..=9 mean 4.5
        assert_relative_eq!(tornado_swing(&x, &x), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_variable_is_fully_correlated() {
        let s = SampleMatrix::from_unnamed_columns(vec![vec![3.0, 1.0, 2.0, 5.0]]).unwrap();
        let report = perform_sensitivity_analysis(&s).unwrap();
        assert_relative_eq!(report.variables[0].pearson, 1.0, epsilon = 1e-12);
        assert_relative_eq!(report.variables[0].spearman, 1.0, epsilon = 1e-12);
        assert_relative_eq!(report.output_mean, 2.75);
    }

    #[test]
    fn test_tiny_sample_uses_one_row_tails() {
        let x = [1.0, 2.0];
        assert_eq!(tornado_swing(&x, &[10.0, 30.0]), 20.0);
    }
}
