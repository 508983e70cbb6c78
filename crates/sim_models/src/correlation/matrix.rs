//! Correlation matrix with validation and Cholesky decomposition.

use serde::{Deserialize, Serialize};

use super::error::CorrelationError;

/// Tolerance for unit-diagonal and symmetry checks.
const ENTRY_TOLERANCE: f64 = 1e-10;

/// Pivots at or below this are treated as zero (semi-definite column).
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Largest residual accepted below a zero pivot.
const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Correlation matrix with validation and Cholesky decomposition.
///
/// A correlation matrix must satisfy:
/// - Square and symmetric
/// - Diagonal elements equal to 1.0
/// - Off-diagonal elements in [-1, 1]
/// - Positive semi-definite
///
/// Serialised as a list of rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CorrelationMatrix {
    /// Matrix elements in row-major order
    data: Vec<f64>,
    /// Matrix dimension (n x n)
    dim: usize,
}

impl CorrelationMatrix {
    /// Creates a correlation matrix from a flat row-major array.
    ///
    /// # Validation
    ///
    /// - Must have exactly `dim * dim` elements, `dim >= 1`
    /// - Entries must lie in [-1, 1]
    /// - Diagonal elements must be 1.0
    /// - Must be symmetric
    /// - Must be positive semi-definite
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        if dim == 0 {
            return Err(CorrelationError::InvalidParameter(
                "correlation matrix must have at least one row".to_string(),
            ));
        }
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::NotSquare {
                row: 0,
                expected,
                got: data.len(),
            });
        }

        for i in 0..dim {
            for j in 0..dim {
                let value = data[i * dim + j];
                if !(-1.0..=1.0).contains(&value) {
                    return Err(CorrelationError::OutOfRange { i, j, value });
                }
            }
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > ENTRY_TOLERANCE {
                return Err(CorrelationError::InvalidDiagonal { index: i, value: diag });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                if (data[i * dim + j] - data[j * dim + i]).abs() > ENTRY_TOLERANCE {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
            }
        }

        let matrix = Self {
            data: data.to_vec(),
            dim,
        };
        matrix.cholesky()?;
        Ok(matrix)
    }

    /// Creates a correlation matrix from rows.
    ///
    /// ```
    /// use sim_models::correlation::{CorrelationError, CorrelationMatrix};
    ///
    /// let m = CorrelationMatrix::from_rows(&[vec![1.0, 0.3], vec![0.3, 1.0]]).unwrap();
    /// assert_eq!(m.get(1, 0), 0.3);
    ///
    /// let err = CorrelationMatrix::from_rows(&[vec![1.0, 0.3], vec![0.3]]).unwrap_err();
    /// assert!(matches!(err, CorrelationError::NotSquare { row: 1, .. }));
    /// ```
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CorrelationError> {
        let dim = rows.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(CorrelationError::NotSquare {
                    row,
                    expected: dim,
                    got: values.len(),
                });
            }
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(&data, dim)
    }

    /// Builds a matrix from entries already known to be a valid correlation
    /// matrix (e.g. a Pearson estimate), skipping the factorisation check.
    pub(crate) fn from_trusted(data: Vec<f64>, dim: usize) -> Self {
        Self { data, dim }
    }

    /// Create an identity correlation matrix (no correlation).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Row-major elements.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copies the matrix into rows.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.dim.max(1)).map(<[f64]>::to_vec).collect()
    }

    /// Whether every off-diagonal element is zero.
    pub fn is_identity(&self) -> bool {
        (0..self.dim).all(|i| (0..self.dim).all(|j| i == j || self.get(i, j) == 0.0))
    }

    /// Mean of the strictly upper-triangular elements (`0.0` for 1×1).
    pub fn mean_off_diagonal(&self) -> f64 {
        let n = self.dim;
        if n < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                sum += self.get(i, j);
            }
        }
        sum / (n * (n - 1) / 2) as f64
    }

    /// Computes the lower triangular L with C = L · Lᵀ.
    ///
    /// Positive semi-definite matrices are accepted: a pivot that is zero
    /// within tolerance yields a zero column, provided every residual below
    /// it is also zero.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CorrelationError> {
        let n = self.dim;
        let mut lower = vec![0.0; n * n];

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                let l_jk = lower[j * n + k];
                sum += l_jk * l_jk;
            }
            let diag = self.get(j, j) - sum;

            if diag < -PIVOT_TOLERANCE {
                return Err(CorrelationError::NotPositiveSemiDefinite { pivot: j });
            }

            if diag <= PIVOT_TOLERANCE {
                // Column j is a linear combination of earlier columns
                for i in (j + 1)..n {
                    let mut residual = self.get(i, j);
                    for k in 0..j {
                        residual -= lower[i * n + k] * lower[j * n + k];
                    }
                    if residual.abs() > RESIDUAL_TOLERANCE {
                        return Err(CorrelationError::NotPositiveSemiDefinite { pivot: j });
                    }
                }
                continue;
            }

            let l_jj = diag.sqrt();
            lower[j * n + j] = l_jj;
            for i in (j + 1)..n {
                let mut s = self.get(i, j);
                for k in 0..j {
                    s -= lower[i * n + k] * lower[j * n + k];
                }
                lower[i * n + j] = s / l_jj;
            }
        }

        Ok(CholeskyFactor { data: lower, dim: n })
    }
}

impl TryFrom<Vec<Vec<f64>>> for CorrelationMatrix {
    type Error = CorrelationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<CorrelationMatrix> for Vec<Vec<f64>> {
    fn from(matrix: CorrelationMatrix) -> Self {
        matrix.rows()
    }
}

/// Lower triangular Cholesky factor of a correlation matrix.
///
/// Used to transform independent standard normals into correlated normals.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    /// Lower triangular matrix elements (row-major)
    data: Vec<f64>,
    /// Matrix dimension
    dim: usize,
}

impl CholeskyFactor {
    /// Matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j); zero above the diagonal.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Transform independent standard normals to correlated normals.
    ///
    /// # Panics
    ///
    /// Panics if `z.len() < self.dim()`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut w = vec![0.0; self.dim];
        self.transform_into(z, &mut w);
        w
    }

    /// Computes `W = L · Z` into a caller-provided buffer.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `w` is shorter than `self.dim()`.
    pub fn transform_into(&self, z: &[f64], w: &mut [f64]) {
        assert!(
            z.len() >= self.dim && w.len() >= self.dim,
            "Input vector length {} is less than matrix dimension {}",
            z.len().min(w.len()),
            self.dim
        );

        let n = self.dim;
        for i in 0..n {
            let row = &self.data[i * n..i * n + i + 1];
            w[i] = row.iter().zip(z).map(|(l, z)| l * z).sum();
        }
    }
}

/// Whether `rows` form a valid correlation matrix: square, symmetric, unit
/// diagonal, entries in [-1, 1] and positive semi-definite.
///
/// ```
/// use sim_models::correlation::validate_correlation_matrix;
///
/// assert!(validate_correlation_matrix(&[vec![1.0, 0.5], vec![0.5, 1.0]]));
/// assert!(!validate_correlation_matrix(&[vec![1.0, 0.5], vec![0.4, 1.0]]));
/// assert!(!validate_correlation_matrix(&[vec![2.0, 0.5], vec![0.5, 1.0]]));
/// ```
pub fn validate_correlation_matrix(rows: &[Vec<f64>]) -> bool {
    check_correlation_matrix(rows).is_ok()
}

/// Like [`validate_correlation_matrix`], but returns the Cholesky factor or
/// the reason for rejection.
pub fn check_correlation_matrix(rows: &[Vec<f64>]) -> Result<CholeskyFactor, CorrelationError> {
    CorrelationMatrix::from_rows(rows)?.cholesky()
}
