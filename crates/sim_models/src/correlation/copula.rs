//! Copula-based correlated sampling.

use rand::Rng;
use rand_distr::{ChiSquared, Distribution as RandDistribution, StandardNormal};
use serde::{Deserialize, Serialize};
use sim_core::SampleMatrix;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::error::CorrelationError;
use super::matrix::CorrelationMatrix;
use crate::distributions::special::norm_cdf;
use crate::distributions::{VariableDefinition, PROBABILITY_CLAMP};

/// Degrees of freedom used by [`Copula::student_t`].
pub const DEFAULT_DEGREES_OF_FREEDOM: f64 = 5.0;

fn default_degrees_of_freedom() -> f64 {
    DEFAULT_DEGREES_OF_FREEDOM
}

/// Dependence structure used to join the marginals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Copula {
    /// Multivariate normal; no tail dependence
    #[default]
    Gaussian,
    /// Multivariate Student-t; joint extremes become more likely as the
    /// degrees of freedom fall
    StudentT {
        /// Degrees of freedom (> 0)
        #[serde(default = "default_degrees_of_freedom")]
        degrees_of_freedom: f64,
    },
}

impl Copula {
    /// Student-t copula with [`DEFAULT_DEGREES_OF_FREEDOM`].
    pub fn student_t() -> Self {
        Self::StudentT {
            degrees_of_freedom: DEFAULT_DEGREES_OF_FREEDOM,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::StudentT { .. } => "student_t",
        }
    }

    /// Checks the degrees of freedom.
    pub fn validate(&self) -> Result<(), CorrelationError> {
        match *self {
            Self::Gaussian => Ok(()),
            Self::StudentT { degrees_of_freedom } => {
                if degrees_of_freedom.is_finite() && degrees_of_freedom > 0.0 {
                    Ok(())
                } else {
                    Err(CorrelationError::InvalidParameter(format!(
                        "degrees of freedom must be > 0, got {}",
                        degrees_of_freedom
                    )))
                }
            }
        }
    }
}

/// Copula CDF and mixing variable, prepared once per call.
enum Prepared {
    Gaussian,
    StudentT {
        dof: f64,
        mixing: ChiSquared<f64>,
        cdf: StudentsT,
    },
}

impl Prepared {
    fn new(copula: &Copula) -> Result<Self, CorrelationError> {
        copula.validate()?;
        match *copula {
            Copula::Gaussian => Ok(Self::Gaussian),
            Copula::StudentT { degrees_of_freedom } => Ok(Self::StudentT {
                dof: degrees_of_freedom,
                mixing: ChiSquared::new(degrees_of_freedom)
                    .map_err(|e| CorrelationError::InvalidParameter(e.to_string()))?,
                cdf: StudentsT::new(0.0, 1.0, degrees_of_freedom)
                    .map_err(|e| CorrelationError::InvalidParameter(e.to_string()))?,
            }),
        }
    }
}

/// Draws `size` joint samples with the given marginals and correlation.
///
/// # Algorithm
///
/// 1. Draw `Z ~ N(0, I)` and form `W = L · Z` with `L` the Cholesky factor
///    of `matrix`. For the Student-t copula, scale the whole vector by
///    `sqrt(ν / S)` with `S ~ χ²(ν)`.
/// 2. Map each component to `U(0, 1)` through the copula's own CDF,
///    clamping to `(1e-12, 1 − 1e-12)`.
/// 3. Apply each variable's quantile function.
///
/// Columns are named after the variables, in declaration order.
///
/// # Errors
///
/// - [`CorrelationError::DimensionMismatch`] if `matrix.dim()` differs from
///   the number of variables
/// - [`CorrelationError::Distribution`] if any marginal is invalid; no
///   sampling happens in that case
/// - [`CorrelationError::Samples`] if `size == 0` or names repeat
pub fn generate_correlated_samples<R: Rng + ?Sized>(
    variables: &[VariableDefinition],
    matrix: &CorrelationMatrix,
    size: usize,
    copula: &Copula,
    rng: &mut R,
) -> Result<SampleMatrix, CorrelationError> {
    let dim = matrix.dim();
    if variables.len() != dim {
        return Err(CorrelationError::DimensionMismatch {
            expected: dim,
            got: variables.len(),
        });
    }
    for var in variables {
        var.distribution.validate()?;
    }
    let prepared = Prepared::new(copula)?;
    let factor = matrix.cholesky()?;

    let mut uniforms: Vec<Vec<f64>> = (0..dim).map(|_| Vec::with_capacity(size)).collect();
    let mut z = vec![0.0; dim];
    let mut w = vec![0.0; dim];

    for _ in 0..size {
        for zi in z.iter_mut() {
            *zi = StandardNormal.sample(rng);
        }
        factor.transform_into(&z, &mut w);

        match &prepared {
            Prepared::Gaussian => {
                for (col, &wi) in uniforms.iter_mut().zip(&w) {
                    col.push(clamp(norm_cdf(wi)));
                }
            }
            Prepared::StudentT { dof, mixing, cdf } => {
                let s: f64 = mixing.sample(rng);
                let scale = (dof / s.max(f64::MIN_POSITIVE)).sqrt();
                for (col, &wi) in uniforms.iter_mut().zip(&w) {
                    col.push(clamp(cdf.cdf(wi * scale)));
                }
            }
        }
    }

    let names = variables.iter().map(|v| v.name.clone()).collect();
    let columns = variables
        .iter()
        .zip(&uniforms)
        .map(|(var, u)| var.distribution.quantiles(u))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SampleMatrix::from_columns(names, columns)?)
}

#[inline]
fn clamp(u: f64) -> f64 {
    u.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP)
}
