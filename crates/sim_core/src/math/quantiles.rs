//! Order statistics.

/// A sorted copy of a sample, for repeated percentile queries.
///
/// Sorting uses `f64::total_cmp`, so the order is total even though
/// [`SampleMatrix`](crate::SampleMatrix) already guarantees finite values.
///
/// # Examples
///
/// ```rust
/// use sim_core::math::SortedSamples;
///
/// let sorted = SortedSamples::new(&[4.0, 1.0, 3.0, 2.0, 5.0]);
/// assert_eq!(sorted.median(), 3.0);
/// assert_eq!(sorted.percentile(25.0), 2.0);
/// assert!((sorted.percentile(90.0) - 4.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SortedSamples {
    values: Vec<f64>,
}

impl SortedSamples {
    /// Copies and sorts `values`.
    pub fn new(values: &[f64]) -> Self {
        let mut values = values.to_vec();
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    /// Percentile `q` in `[0, 100]` with linear interpolation.
    ///
    /// `q` is clamped to `[0, 100]`. Returns `0.0` for an empty sample.
    pub fn percentile(&self, q: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        let idx = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
        let lo = idx.floor() as usize;
        let hi = idx.ceil() as usize;
        let frac = idx - lo as f64;
        self.values[lo] + (self.values[hi] - self.values[lo]) * frac
    }

    /// Quantile `p` in `[0, 1]`.
    #[inline]
    pub fn quantile(&self, p: f64) -> f64 {
        self.percentile(p * 100.0)
    }

    /// 50th percentile.
    #[inline]
    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// Smallest value (`0.0` when empty).
    #[inline]
    pub fn min(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    /// Largest value (`0.0` when empty).
    #[inline]
    pub fn max(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Sample size.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sample is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted values.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Mean of values `>= threshold`. See [`tail_mean`].
    pub fn tail_mean(&self, threshold: f64) -> f64 {
        let start = self.values.partition_point(|&v| v < threshold);
        let tail = &self.values[start..];
        if tail.is_empty() {
            threshold
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        }
    }

    /// Fraction of values strictly above `threshold`.
    pub fn exceedance(&self, threshold: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let start = self.values.partition_point(|&v| v <= threshold);
        (self.values.len() - start) as f64 / self.values.len() as f64
    }
}

/// Mean of the values at or above `threshold`.
///
/// When no value reaches the threshold the threshold itself is returned,
/// which keeps expected shortfall no smaller than the quantile it is
/// measured from.
pub fn tail_mean(values: &[f64], threshold: f64) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|&&v| v >= threshold)
        .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        threshold
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_interpolates() {
        let s = SortedSamples::new(&[10.0, 20.0, 30.0, 40.0]);
        assert_relative_eq!(s.percentile(0.0), 10.0);
        assert_relative_eq!(s.percentile(100.0), 40.0);
        // idx = 0.5 * 3 = 1.5
        assert_relative_eq!(s.percentile(50.0), 25.0);
        // idx = 0.95 * 3 = 2.85
        assert_relative_eq!(s.percentile(95.0), 38.5, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_clamps_and_empty() {
        let s = SortedSamples::new(&[1.0, 2.0]);
        assert_relative_eq!(s.percentile(-5.0), 1.0);
        assert_relative_eq!(s.percentile(150.0), 2.0);
        let empty = SortedSamples::new(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.percentile(50.0), 0.0);
        assert_eq!(empty.max(), 0.0);
    }

    #[test]
    fn test_single_value() {
        let s = SortedSamples::new(&[7.0]);
        assert_eq!(s.percentile(99.0), 7.0);
        assert_eq!(s.min(), 7.0);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_tail_mean() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(tail_mean(&x, 4.0), 4.5);
        assert_relative_eq!(tail_mean(&x, 10.0), 10.0);
        let s = SortedSamples::new(&x);
        assert_relative_eq!(s.tail_mean(4.0), 4.5);
        assert_relative_eq!(s.tail_mean(3.5), 4.5);
    }

    #[test]
    fn test_exceedance_is_strict() {
        let s = SortedSamples::new(&[1.0, 2.0, 2.0, 3.0]);
        assert_relative_eq!(s.exceedance(2.0), 0.25);
        assert_relative_eq!(s.exceedance(0.0), 1.0);
        assert_relative_eq!(s.exceedance(3.0), 0.0);
    }
}
