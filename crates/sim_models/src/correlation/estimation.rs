//! Correlation estimation and significance testing.

use serde::{Deserialize, Serialize};
use sim_core::math::pearson;
use sim_core::SampleMatrix;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::error::CorrelationError;
use super::matrix::CorrelationMatrix;

/// Pearson correlation matrix of the sample columns.
///
/// Columns with zero variance get `0.0` off-diagonal entries; the diagonal
/// is always exactly 1.
pub fn estimate_correlation_matrix(samples: &SampleMatrix) -> CorrelationMatrix {
    let n = samples.n_cols();
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        data[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(samples.column(i), samples.column(j));
            data[i * n + j] = r;
            data[j * n + i] = r;
        }
    }
    CorrelationMatrix::from_trusted(data, n)
}

/// Pairwise correlation significance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignificanceMatrix {
    /// Significance level used
    pub alpha: f64,
    /// Number of observations
    pub observations: usize,
    /// Pearson correlations
    pub correlations: Vec<Vec<f64>>,
    /// Two-sided p-values
    pub p_values: Vec<Vec<f64>>,
    /// `p_value < alpha`; the diagonal is always significant
    pub significant: Vec<Vec<bool>>,
}

/// Tests each pairwise correlation against zero.
///
/// Uses `t = r · sqrt((n − 2) / (1 − r²))` with `n − 2` degrees of freedom
/// and a two-sided p-value.
///
/// # Errors
///
/// - [`CorrelationError::InsufficientData`] when there are fewer than 3 rows
/// - [`CorrelationError::InvalidParameter`] when `alpha` is not in (0, 1)
pub fn test_correlation_significance(
    samples: &SampleMatrix,
    alpha: f64,
) -> Result<SignificanceMatrix, CorrelationError> {
    let n = samples.n_rows();
    if n < 3 {
        return Err(CorrelationError::InsufficientData { required: 3, got: n });
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(CorrelationError::InvalidParameter(format!(
            "alpha must lie in (0, 1), got {}",
            alpha
        )));
    }

    let df = (n - 2) as f64;
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| CorrelationError::InvalidParameter(e.to_string()))?;

    let estimated = estimate_correlation_matrix(samples);
    let k = estimated.dim();
    let correlations = estimated.rows();
    let mut p_values = vec![vec![0.0; k]; k];
    let mut significant = vec![vec![true; k]; k];

    for i in 0..k {
        for j in (i + 1)..k {
            let r = correlations[i][j];
            let denom = 1.0 - r * r;
            let p = if denom <= 0.0 {
                0.0
            } else {
                let t = r * (df / denom).sqrt();
                (2.0 * (1.0 - t_dist.cdf(t.abs()))).clamp(0.0, 1.0)
            };
            p_values[i][j] = p;
            p_values[j][i] = p;
            significant[i][j] = p < alpha;
            significant[j][i] = p < alpha;
        }
    }

    Ok(SignificanceMatrix {
        alpha,
        observations: n,
        correlations,
        p_values,
        significant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_core::rng::SimRng;

    fn matrix(columns: Vec<Vec<f64>>) -> SampleMatrix {
        SampleMatrix::from_unnamed_columns(columns).unwrap()
    }

    #[test]
    fn test_estimate_perfect_and_constant() {
        let s = matrix(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 4.0, 6.0, 8.0],
            vec![5.0, 5.0, 5.0, 5.0],
        ]);
        let c = estimate_correlation_matrix(&s);
        assert_relative_eq!(c.get(0, 1), 1.0, epsilon = 1e-12);
        assert_eq!(c.get(0, 2), 0.0);
        assert_eq!(c.get(2, 2), 1.0);
    }

    #[test]
    fn test_significance_requires_three_rows() {
        let s = matrix(vec![vec![1.0, 2.0], vec![2.0, 1.0]]);
        assert_eq!(
            test_correlation_significance(&s, 0.05).unwrap_err(),
            CorrelationError::InsufficientData { required: 3, got: 2 }
        );
    }

    #[test]
    fn test_significance_rejects_bad_alpha() {
        let s = matrix(vec![vec![1.0, 2.0, 3.0], vec![2.0, 1.0, 0.0]]);
        assert!(test_correlation_significance(&s, 1.5).is_err());
        assert!(test_correlation_significance(&s, 0.0).is_err());
    }

    #[test]
    fn test_significance_detects_dependence() {
        let mut rng = SimRng::from_seed(21);
        let mut x = vec![0.0; 500];
        let mut noise = vec![0.0; 500];
        let mut independent = vec![0.0; 500];
        rng.fill_normal(&mut x);
        rng.fill_normal(&mut noise);
        rng.fill_normal(&mut independent);
        let y: Vec<f64> = x.iter().zip(&noise).map(|(a, b)| a + 0.5 * b).collect();

        let s = matrix(vec![x, y, independent]);
        let result = test_correlation_significance(&s, 0.01).unwrap();
        assert!(result.significant[0][1]);
        assert!(result.p_values[0][1] < 1e-10);
        assert_eq!(result.p_values[0][1], result.p_values[1][0]);
        assert!(result.significant[2][2]);
        assert_eq!(result.observations, 500);
    }

    #[test]
    fn test_p_value_reference() {
        // r = 0.5, n = 10: t = 0.5 * sqrt(8 / 0.75) = 1.63299, p ≈ 0.1411
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let r_target = 0.5;
        // y = r·x̃ + sqrt(1 − r²)·ỹ with x̃, ỹ orthogonal standardised vectors
        let xm = 5.5;
        let xs: Vec<f64> = x.iter().map(|v| v - xm).collect();
        let ortho = [1.0, -1.0, -1.0, 1.0, 0.0, 0.0, 1.0, -1.0, -1.0, 1.0];
        let proj: f64 = xs.iter().zip(&ortho).map(|(a, b)| a * b).sum::<f64>()
            / xs.iter().map(|a| a * a).sum::<f64>();
        let o: Vec<f64> = ortho.iter().zip(&xs).map(|(b, a)| b - proj * a).collect();
        let nx = xs.iter().map(|a| a * a).sum::<f64>().sqrt();
        let no = o.iter().map(|a| a * a).sum::<f64>().sqrt();
        let y: Vec<f64> = xs
            .iter()
            .zip(&o)
            .map(|(a, b)| r_target * a / nx + (1.0 - r_target * r_target).sqrt() * b / no)
            .collect();

        let s = matrix(vec![x.to_vec(), y]);
        let result = test_correlation_significance(&s, 0.05).unwrap();
        assert_relative_eq!(result.correlations[0][1], 0.5, epsilon = 1e-10);
        assert_relative_eq!(result.p_values[0][1], 0.1411, epsilon = 1e-3);
        assert!(!result.significant[0][1]);
    }
}
