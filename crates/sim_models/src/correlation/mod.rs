//! Correlation Engine.
//!
//! Correlation matrix validation, Cholesky factorisation, copula-based
//! correlated sampling, estimation and significance testing.
//!
//! ## Mathematical Background
//!
//! Given `n` independent standard normals `Z`, correlated normals are
//! `W = L · Z` where `L` is the lower Cholesky factor of the correlation
//! matrix `C = L · Lᵀ`. A copula maps each `W_i` to a uniform through the
//! copula's own CDF and then through the target marginal's quantile
//! function, so the marginals are exact while the dependence follows `C`.
//!
//! ## Usage
//!
//! ```
//! use sim_core::rng::SimRng;
//! use sim_models::correlation::{
//!     estimate_correlation_matrix, generate_correlated_samples, Copula, CorrelationMatrix,
//! };
//! use sim_models::distributions::{Distribution, VariableDefinition};
//!
//! let corr = CorrelationMatrix::from_rows(&[vec![1.0, 0.7], vec![0.7, 1.0]]).unwrap();
//! let vars = vec![
//!     VariableDefinition::new("a", Distribution::Normal { mean: 0.0, std: 1.0 }),
//!     VariableDefinition::new("b", Distribution::Exponential { scale: 2.0 }),
//! ];
//!
//! let mut rng = SimRng::from_seed(42);
//! let samples =
//!     generate_correlated_samples(&vars, &corr, 5_000, &Copula::Gaussian, &mut rng).unwrap();
//! let estimated = estimate_correlation_matrix(&samples);
//! assert!(estimated.get(0, 1) > 0.5);
//! ```

mod copula;
mod error;
mod estimation;
mod generation;
mod matrix;

pub use copula::{generate_correlated_samples, Copula, DEFAULT_DEGREES_OF_FREEDOM};
pub use error::CorrelationError;
pub use estimation::{estimate_correlation_matrix, test_correlation_significance, SignificanceMatrix};
pub use generation::{generate_correlation_matrix, MatrixMethod, DEFAULT_MIN_EIGENVALUE};
pub use matrix::{check_correlation_matrix, validate_correlation_matrix, CholeskyFactor, CorrelationMatrix};
