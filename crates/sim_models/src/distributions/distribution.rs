//! The [`Distribution`] enum: sampling, CDFs, quantiles and moments.

use rand::Rng;
use rand_distr::Distribution as RandDistribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, DiscreteCDF};
use statrs::function::gamma::gamma as gamma_fn;

use super::error::DistributionError;
use super::info::DistributionKind;
use super::special::{norm_cdf, norm_quantile};

/// Probabilities passed to quantile functions are clamped to
/// `[PROBABILITY_CLAMP, 1 − PROBABILITY_CLAMP]` so every quantile is finite.
pub const PROBABILITY_CLAMP: f64 = 1e-12;

/// A marginal distribution with its parameters.
///
/// Serialised with an internal `distribution` tag:
///
/// ```
/// use sim_models::distributions::Distribution;
///
/// let json = r#"{"distribution": "gamma", "shape": 2.0, "scale": 0.05}"#;
/// let dist: Distribution = serde_json::from_str(json).unwrap();
/// assert_eq!(dist, Distribution::Gamma { shape: 2.0, scale: 0.05 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    /// Normal with mean and standard deviation
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation (> 0)
        std: f64,
    },
    /// Log-normal; `mean` and `std` describe the underlying normal
    Lognormal {
        /// Mean of ln X
        mean: f64,
        /// Standard deviation of ln X (> 0)
        std: f64,
    },
    /// Uniform on `[low, high)`
    Uniform {
        /// Lower bound
        low: f64,
        /// Upper bound (> low)
        high: f64,
    },
    /// Exponential with the given mean
    Exponential {
        /// Mean (> 0)
        scale: f64,
    },
    /// Gamma with shape/scale
    Gamma {
        /// Shape k (> 0)
        shape: f64,
        /// Scale theta (> 0)
        scale: f64,
    },
    /// Beta on (0, 1)
    Beta {
        /// First shape (> 0)
        alpha: f64,
        /// Second shape (> 0)
        beta: f64,
    },
    /// Weibull with shape/scale
    Weibull {
        /// Shape k (> 0)
        shape: f64,
        /// Scale lambda (> 0)
        scale: f64,
    },
    /// Poisson counts
    Poisson {
        /// Expected count (> 0)
        lambda: f64,
    },
}

fn require_finite(kind: DistributionKind, name: &str, value: f64) -> Result<(), DistributionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DistributionError::invalid(kind, name, format!("must be finite, got {}", value)))
    }
}

fn require_positive(kind: DistributionKind, name: &str, value: f64) -> Result<(), DistributionError> {
    require_finite(kind, name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(DistributionError::invalid(kind, name, format!("must be > 0, got {}", value)))
    }
}

/// Clamps a probability into the open unit interval.
#[inline]
pub(crate) fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP)
}

fn draw<R, D>(dist: D, count: usize, rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
    D: RandDistribution<f64>,
{
    (0..count).map(|_| dist.sample(rng)).collect()
}

impl Distribution {
    /// The kind of this distribution.
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Normal { .. } => DistributionKind::Normal,
            Self::Lognormal { .. } => DistributionKind::Lognormal,
            Self::Uniform { .. } => DistributionKind::Uniform,
            Self::Exponential { .. } => DistributionKind::Exponential,
            Self::Gamma { .. } => DistributionKind::Gamma,
            Self::Beta { .. } => DistributionKind::Beta,
            Self::Weibull { .. } => DistributionKind::Weibull,
            Self::Poisson { .. } => DistributionKind::Poisson,
        }
    }

    /// Parameters as `(name, value)` pairs in declaration order.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Self::Normal { mean, std } | Self::Lognormal { mean, std } => {
                vec![("mean", mean), ("std", std)]
            }
            Self::Uniform { low, high } => vec![("low", low), ("high", high)],
            Self::Exponential { scale } => vec![("scale", scale)],
            Self::Gamma { shape, scale } | Self::Weibull { shape, scale } => {
                vec![("shape", shape), ("scale", scale)]
            }
            Self::Beta { alpha, beta } => vec![("alpha", alpha), ("beta", beta)],
            Self::Poisson { lambda } => vec![("lambda", lambda)],
        }
    }

    /// Checks every parameter against its domain.
    ///
    /// # Errors
    ///
    /// [`DistributionError::InvalidParameter`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<(), DistributionError> {
        let kind = self.kind();
        match *self {
            Self::Normal { mean, std } | Self::Lognormal { mean, std } => {
                require_finite(kind, "mean", mean)?;
                require_positive(kind, "std", std)
            }
            Self::Uniform { low, high } => {
                require_finite(kind, "low", low)?;
                require_finite(kind, "high", high)?;
                if low >= high {
                    Err(DistributionError::invalid(
                        kind,
                        "high",
                        format!("must exceed low ({}), got {}", low, high),
                    ))
                } else if !(high - low).is_finite() {
                    Err(DistributionError::invalid(
                        kind,
                        "high",
                        format!("range {}..{} overflows f64", low, high),
                    ))
                } else {
                    Ok(())
                }
            }
            Self::Exponential { scale } => require_positive(kind, "scale", scale),
            Self::Gamma { shape, scale } | Self::Weibull { shape, scale } => {
                require_positive(kind, "shape", shape)?;
                require_positive(kind, "scale", scale)
            }
            Self::Beta { alpha, beta } => {
                require_positive(kind, "alpha", alpha)?;
                require_positive(kind, "beta", beta)
            }
            Self::Poisson { lambda } => require_positive(kind, "lambda", lambda),
        }
    }

    /// Returns a copy with parameter `name` set to `value`.
    ///
    /// Used to late-bind parameters from live data feeds.
    ///
    /// ```
    /// use sim_models::distributions::Distribution;
    ///
    /// let d = Distribution::Normal { mean: 0.0, std: 1.0 };
    /// let bound = d.with_parameter("mean", 5.0).unwrap();
    /// assert_eq!(bound, Distribution::Normal { mean: 5.0, std: 1.0 });
    /// assert!(d.with_parameter("std", -1.0).is_err());
    /// assert!(d.with_parameter("lambda", 1.0).is_err());
    /// ```
    pub fn with_parameter(&self, name: &str, value: f64) -> Result<Self, DistributionError> {
        let mut updated = *self;
        let slot = match (&mut updated, name) {
            (Self::Normal { mean, .. } | Self::Lognormal { mean, .. }, "mean") => mean,
            (Self::Normal { std, .. } | Self::Lognormal { std, .. }, "std") => std,
            (Self::Uniform { low, .. }, "low") => low,
            (Self::Uniform { high, .. }, "high") => high,
            (
                Self::Exponential { scale }
                | Self::Gamma { scale, .. }
                | Self::Weibull { scale, .. },
                "scale",
            ) => scale,
            (Self::Gamma { shape, .. } | Self::Weibull { shape, .. }, "shape") => shape,
            (Self::Beta { alpha, .. }, "alpha") => alpha,
            (Self::Beta { beta, .. }, "beta") => beta,
            (Self::Poisson { lambda }, "lambda") => lambda,
            _ => {
                return Err(DistributionError::UnknownParameter {
                    kind: self.kind(),
                    parameter: name.to_string(),
                })
            }
        };
        *slot = value;
        updated.validate()?;
        Ok(updated)
    }

    /// Draws `count` independent samples.
    ///
    /// # Errors
    ///
    /// [`DistributionError::InvalidParameter`] if the parameters are out of
    /// domain. Nothing is drawn in that case.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>, DistributionError> {
        self.validate()?;
        let kind = self.kind();
        let err = |e: &dyn std::fmt::Display| DistributionError::invalid(kind, "parameters", e.to_string());

        let values = match *self {
            Self::Normal { mean, std } => {
                draw(rand_distr::Normal::new(mean, std).map_err(|e| err(&e))?, count, rng)
            }
            Self::Lognormal { mean, std } => {
                draw(rand_distr::LogNormal::new(mean, std).map_err(|e| err(&e))?, count, rng)
            }
            Self::Uniform { low, high } => draw(rand_distr::Uniform::new(low, high), count, rng),
            Self::Exponential { scale } => {
                draw(rand_distr::Exp::new(1.0 / scale).map_err(|e| err(&e))?, count, rng)
            }
            Self::Gamma { shape, scale } => {
                draw(rand_distr::Gamma::new(shape, scale).map_err(|e| err(&e))?, count, rng)
            }
            Self::Beta { alpha, beta } => {
                draw(rand_distr::Beta::new(alpha, beta).map_err(|e| err(&e))?, count, rng)
            }
            Self::Weibull { shape, scale } => {
                draw(rand_distr::Weibull::new(scale, shape).map_err(|e| err(&e))?, count, rng)
            }
            Self::Poisson { lambda } => {
                draw(rand_distr::Poisson::new(lambda).map_err(|e| err(&e))?, count, rng)
            }
        };
        Ok(values)
    }

    /// Cumulative distribution function at `x`.
    pub fn cdf(&self, x: f64) -> Result<f64, DistributionError> {
        self.validate()?;
        let kind = self.kind();
        let value = match *self {
            Self::Normal { mean, std } => norm_cdf((x - mean) / std),
            Self::Lognormal { mean, std } => {
                if x <= 0.0 {
                    0.0
                } else {
                    norm_cdf((x.ln() - mean) / std)
                }
            }
            Self::Uniform { low, high } => ((x - low) / (high - low)).clamp(0.0, 1.0),
            Self::Exponential { scale } => {
                if x <= 0.0 {
                    0.0
                } else {
                    -(-x / scale).exp_m1()
                }
            }
            Self::Gamma { shape, scale } => {
                if x <= 0.0 {
                    0.0
                } else {
                    statrs::distribution::Gamma::new(shape, 1.0 / scale)
                        .map_err(|e| DistributionError::invalid(kind, "parameters", e.to_string()))?
                        .cdf(x)
                }
            }
            Self::Beta { alpha, beta } => {
                if x <= 0.0 {
                    0.0
                } else if x >= 1.0 {
                    1.0
                } else {
                    statrs::distribution::Beta::new(alpha, beta)
                        .map_err(|e| DistributionError::invalid(kind, "parameters", e.to_string()))?
                        .cdf(x)
                }
            }
            Self::Weibull { shape, scale } => {
                if x <= 0.0 {
                    0.0
                } else {
                    -(-(x / scale).powf(shape)).exp_m1()
                }
            }
            Self::Poisson { lambda } => {
                if x < 0.0 {
                    0.0
                } else {
                    statrs::distribution::Poisson::new(lambda)
                        .map_err(|e| DistributionError::invalid(kind, "parameters", e.to_string()))?
                        .cdf(x.floor() as u64)
                }
            }
        };
        Ok(value)
    }

    /// Quantile (inverse CDF) at probability `p`.
    ///
    /// `p` must lie in `[0, 1]`; it is clamped by [`PROBABILITY_CLAMP`] so
    /// the result is always finite.
    pub fn quantile(&self, p: f64) -> Result<f64, DistributionError> {
        Ok(self.quantiles(&[p])?[0])
    }

    /// Applies the quantile function to every probability in `probs`.
    ///
    /// The statrs distribution objects are built once per call, so this is
    /// the path used by copula sampling.
    pub fn quantiles(&self, probs: &[f64]) -> Result<Vec<f64>, DistributionError> {
        if let Some(&bad) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(DistributionError::invalid(
                self.kind(),
                "p",
                format!("probability must lie in [0, 1], got {}", bad),
            ));
        }
        let inverter = Inverter::new(self)?;
        Ok(probs
            .iter()
            .map(|&p| inverter.eval(clamp_probability(p)))
            .collect())
    }

    /// Theoretical mean.
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Normal { mean, .. } => mean,
            Self::Lognormal { mean, std } => (mean + 0.5 * std * std).exp(),
            Self::Uniform { low, high } => 0.5 * (low + high),
            Self::Exponential { scale } => scale,
            Self::Gamma { shape, scale } => shape * scale,
            Self::Beta { alpha, beta } => alpha / (alpha + beta),
            Self::Weibull { shape, scale } => scale * gamma_fn(1.0 + 1.0 / shape),
            Self::Poisson { lambda } => lambda,
        }
    }

    /// Theoretical variance.
    pub fn variance(&self) -> f64 {
        match *self {
            Self::Normal { std, .. } => std * std,
            Self::Lognormal { mean, std } => {
                let s2 = std * std;
                s2.exp_m1() * (2.0 * mean + s2).exp()
            }
            Self::Uniform { low, high } => (high - low).powi(2) / 12.0,
            Self::Exponential { scale } => scale * scale,
            Self::Gamma { shape, scale } => shape * scale * scale,
            Self::Beta { alpha, beta } => {
                let s = alpha + beta;
                alpha * beta / (s * s * (s + 1.0))
            }
            Self::Weibull { shape, scale } => {
                let g1 = gamma_fn(1.0 + 1.0 / shape);
                let g2 = gamma_fn(1.0 + 2.0 / shape);
                scale * scale * (g2 - g1 * g1)
            }
            Self::Poisson { lambda } => lambda,
        }
    }
}

/// Prepared quantile function for one distribution.
enum Inverter {
    Normal { mean: f64, std: f64 },
    Lognormal { mean: f64, std: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { scale: f64 },
    Weibull { shape: f64, scale: f64 },
    Gamma(statrs::distribution::Gamma, f64),
    Beta(statrs::distribution::Beta, f64),
    Poisson(statrs::distribution::Poisson, f64),
}

impl Inverter {
    fn new(dist: &Distribution) -> Result<Self, DistributionError> {
        dist.validate()?;
        let kind = dist.kind();
        let err = |e: &dyn std::fmt::Display| DistributionError::invalid(kind, "parameters", e.to_string());
        Ok(match *dist {
            Distribution::Normal { mean, std } => Self::Normal { mean, std },
            Distribution::Lognormal { mean, std } => Self::Lognormal { mean, std },
            Distribution::Uniform { low, high } => Self::Uniform { low, high },
            Distribution::Exponential { scale } => Self::Exponential { scale },
            Distribution::Weibull { shape, scale } => Self::Weibull { shape, scale },
            Distribution::Gamma { shape, scale } => Self::Gamma(
                statrs::distribution::Gamma::new(shape, 1.0 / scale).map_err(|e| err(&e))?,
                dist.mean(),
            ),
            Distribution::Beta { alpha, beta } => Self::Beta(
                statrs::distribution::Beta::new(alpha, beta).map_err(|e| err(&e))?,
                dist.mean(),
            ),
            Distribution::Poisson { lambda } => Self::Poisson(
                statrs::distribution::Poisson::new(lambda).map_err(|e| err(&e))?,
                lambda,
            ),
        })
    }

    fn eval(&self, p: f64) -> f64 {
        match *self {
            Self::Normal { mean, std } => mean + std * norm_quantile(p),
            Self::Lognormal { mean, std } => (mean + std * norm_quantile(p)).exp(),
            Self::Uniform { low, high } => low + p * (high - low),
            Self::Exponential { scale } => -scale * (-p).ln_1p(),
            Self::Weibull { shape, scale } => scale * (-(-p).ln_1p()).powf(1.0 / shape),
            Self::Gamma(ref d, mean) => invert_continuous(d, p, 0.0, None, mean),
            Self::Beta(ref d, mean) => invert_continuous(d, p, 0.0, Some(1.0), mean),
            Self::Poisson(ref d, lambda) => invert_discrete(d, p, lambda),
        }
    }
}

/// Safeguarded Newton inversion of a continuous CDF on `[lower, upper]`.
///
/// When `upper` is `None` the bracket is grown by doubling from `start`.
fn invert_continuous<D>(dist: &D, p: f64, lower: f64, upper: Option<f64>, start: f64) -> f64
where
    D: ContinuousCDF<f64, f64> + Continuous<f64, f64>,
{
    let mut lo = lower;
    let mut hi = match upper {
        Some(u) => u,
        None => {
            let mut h = start.max(1.0);
            for _ in 0..1100 {
                if dist.cdf(h) >= p {
                    break;
                }
                lo = h;
                h *= 2.0;
            }
            h
        }
    };

    let mut x = if start > lo && start < hi {
        start
    } else {
        0.5 * (lo + hi)
    };

    for _ in 0..200 {
        let f = dist.cdf(x) - p;
        if f == 0.0 {
            return x;
        }
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }
        if hi - lo <= 1e-15 * hi.abs().max(1e-300) {
            break;
        }
        let d = dist.pdf(x);
        let newton = x - f / d;
        if d.is_finite() && d > 0.0 && newton > lo && newton < hi {
            if (newton - x).abs() <= 1e-14 * x.abs() {
                return newton;
            }
            x = newton;
        } else {
            x = 0.5 * (lo + hi);
        }
    }
    x
}

/// Smallest `k` with `cdf(k) >= p`.
fn invert_discrete<D>(dist: &D, p: f64, mean: f64) -> f64
where
    D: DiscreteCDF<u64, f64>,
{
    let mut hi = (mean + 10.0 * mean.sqrt() + 10.0).ceil() as u64;
    for _ in 0..64 {
        if dist.cdf(hi) >= p {
            break;
        }
        hi = hi.saturating_mul(2);
    }
    let mut lo = 0u64;
    if dist.cdf(0) >= p {
        return 0.0;
    }
    // Invariant: cdf(lo) < p <= cdf(hi)
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if dist.cdf(mid) >= p {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi as f64
}
