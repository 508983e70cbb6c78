//! Linear and rank association between two samples.

use super::moments::mean;

/// Pearson product-moment correlation.
///
/// Returns `0.0` when either input has zero variance or the slices are
/// shorter than two elements. Inputs of different length are truncated to
/// the shorter one.
///
/// # Examples
///
/// ```rust
/// use sim_core::math::pearson;
///
/// let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
/// assert!((r - 1.0).abs() < 1e-12);
/// assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), 0.0);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// 1-based ranks with ties assigned their average rank.
///
/// ```rust
/// use sim_core::math::ranks;
///
/// assert_eq!(ranks(&[30.0, 10.0, 20.0, 10.0]), vec![4.0, 1.5, 3.0, 1.5]);
/// ```
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j share the average of ranks i+1..=j+1
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            out[k] = rank;
        }
        i = j + 1;
    }
    out
}

/// Spearman rank correlation (Pearson on average ranks).
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    pearson(&ranks(&x[..n]), &ranks(&y[..n]))
}

/// Ordinary least-squares fit `y = slope · x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Gradient
    pub slope: f64,
    /// Value at `x = 0`
    pub intercept: f64,
    /// Coefficient of determination (`0.0` when `y` is constant)
    pub r_squared: f64,
}

/// Fits a least-squares line through `(x, y)`.
///
/// A constant `x` yields a zero slope with the intercept at the mean of `y`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
    }

    if sxx <= 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: my,
            r_squared: 0.0,
        };
    }

    let slope = sxy / sxx;
    let r = pearson(x, y);
    LinearFit {
        slope,
        intercept: my - slope * mx,
        r_squared: r * r,
    }
}
