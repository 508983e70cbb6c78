//! Standard normal CDF and quantile.

use statrs::function::erf::{erfc, erfc_inv};

/// Standard normal cumulative distribution function.
///
/// ```
/// use sim_models::distributions::special::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Inverse of [`norm_cdf`] for `p` in `(0, 1)`.
#[inline]
pub fn norm_quantile(p: f64) -> f64 {
    -std::f64::consts::SQRT_2 * erfc_inv(2.0 * p)
}
