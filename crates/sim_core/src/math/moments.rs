//! Population moments.

/// Arithmetic mean. Returns `0.0` for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance. Returns `0.0` for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[inline]
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// First four population moments of a sample.
///
/// `kurtosis` is excess kurtosis (`m4 / m2² − 3`). Skewness and kurtosis
/// are reported as `0.0` when the variance is zero.
///
/// # Examples
///
/// ```rust
/// use sim_core::math::Moments;
///
/// let m = Moments::compute(&[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(m.mean, 2.5);
/// assert_eq!(m.variance, 1.25);
/// assert_eq!(m.skewness, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Arithmetic mean
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Third standardised moment
    pub skewness: f64,
    /// Fourth standardised moment minus 3
    pub kurtosis: f64,
}

impl Moments {
    /// Computes all four moments in two passes.
    pub fn compute(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let m = mean(values);
        if values.is_empty() {
            return Self {
                mean: 0.0,
                variance: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &v in values {
            let d = v - m;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        // Relative cut-off so constant columns with rounding noise stay degenerate.
        let degenerate = m2 <= f64::EPSILON * m.abs().max(1.0).powi(2) * 1e-4;
        let (skewness, kurtosis) = if degenerate {
            (0.0, 0.0)
        } else {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        };

        Self {
            mean: m,
            variance: m2,
            skewness,
            kurtosis,
        }
    }

    /// Population standard deviation.
    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}
