//! Synthetic correlation matrices.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use sim_core::rng::SimRng;

use super::error::CorrelationError;
use super::matrix::CorrelationMatrix;

/// Eigenvalue floor used by [`MatrixMethod::random`].
pub const DEFAULT_MIN_EIGENVALUE: f64 = 1e-6;

/// How to generate a correlation matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatrixMethod {
    /// Symmetric uniform(−1, 1) entries repaired to the nearest valid
    /// correlation matrix by flooring eigenvalues
    Random {
        /// Seed; `None` draws from entropy
        seed: Option<u64>,
        /// Eigenvalue floor (> 0)
        min_eigenvalue: f64,
    },
    /// `C[i][j] = rho^|i − j|`
    Toeplitz {
        /// Lag-one correlation, `|rho| <= 1`
        rho: f64,
    },
}

impl MatrixMethod {
    /// Seeded random method with the default eigenvalue floor.
    pub fn random(seed: u64) -> Self {
        Self::Random {
            seed: Some(seed),
            min_eigenvalue: DEFAULT_MIN_EIGENVALUE,
        }
    }

    /// Toeplitz method.
    pub fn toeplitz(rho: f64) -> Self {
        Self::Toeplitz { rho }
    }
}

/// Generates a `size × size` correlation matrix.
///
/// ```
/// use sim_models::correlation::{generate_correlation_matrix, MatrixMethod};
///
/// let m = generate_correlation_matrix(3, &MatrixMethod::toeplitz(0.5)).unwrap();
/// assert_eq!(m.get(0, 2), 0.25);
///
/// let r = generate_correlation_matrix(6, &MatrixMethod::random(7)).unwrap();
/// assert_eq!(r.dim(), 6);
/// ```
///
/// # Errors
///
/// [`CorrelationError::InvalidParameter`] for `size == 0`, `|rho| > 1` or a
/// non-positive eigenvalue floor.
pub fn generate_correlation_matrix(
    size: usize,
    method: &MatrixMethod,
) -> Result<CorrelationMatrix, CorrelationError> {
    if size == 0 {
        return Err(CorrelationError::InvalidParameter(
            "matrix size must be at least 1".to_string(),
        ));
    }

    match *method {
        MatrixMethod::Toeplitz { rho } => {
            if !(-1.0..=1.0).contains(&rho) {
                return Err(CorrelationError::InvalidParameter(format!(
                    "rho must lie in [-1, 1], got {}",
                    rho
                )));
            }
            let mut data = vec![0.0; size * size];
            for i in 0..size {
                for j in 0..size {
                    data[i * size + j] = rho.powi(i.abs_diff(j) as i32);
                }
            }
            CorrelationMatrix::new(&data, size)
        }
        MatrixMethod::Random {
            seed,
            min_eigenvalue,
        } => {
            if !(min_eigenvalue.is_finite() && min_eigenvalue > 0.0) {
                return Err(CorrelationError::InvalidParameter(format!(
                    "min_eigenvalue must be > 0, got {}",
                    min_eigenvalue
                )));
            }
            let mut rng = match seed {
                Some(seed) => SimRng::from_seed(seed),
                None => SimRng::from_entropy(),
            };
            random_correlation(size, min_eigenvalue, &mut rng)
        }
    }
}

fn random_correlation(
    size: usize,
    min_eigenvalue: f64,
    rng: &mut SimRng,
) -> Result<CorrelationMatrix, CorrelationError> {
    let mut raw = DMatrix::<f64>::identity(size, size);
    for i in 0..size {
        for j in (i + 1)..size {
            let v = 2.0 * rng.gen_uniform() - 1.0;
            raw[(i, j)] = v;
            raw[(j, i)] = v;
        }
    }

    let eigen = raw.symmetric_eigen();
    let floored = eigen.eigenvalues.map(|v| v.max(min_eigenvalue));
    let repaired =
        &eigen.eigenvectors * DMatrix::from_diagonal(&floored) * eigen.eigenvectors.transpose();

    // Rescale to unit diagonal: D^-1/2 · A · D^-1/2
    let scale: Vec<f64> = (0..size).map(|i| repaired[(i, i)].sqrt()).collect();
    let mut data = vec![0.0; size * size];
    for i in 0..size {
        data[i * size + i] = 1.0;
        for j in (i + 1)..size {
            let v = (repaired[(i, j)] / (scale[i] * scale[j])).clamp(-1.0, 1.0);
            data[i * size + j] = v;
            data[j * size + i] = v;
        }
    }

    CorrelationMatrix::new(&data, size)
}
