//! Mean-reverting projection of simulated variables through time.

use serde::{Deserialize, Serialize};
use sim_core::math::{mean, std_dev, SortedSamples};
use sim_core::rng::SimRng;
use sim_core::SampleMatrix;
use sim_models::scenarios::TimeSeriesParams;
use std::collections::BTreeMap;

/// Per-step band of one projected variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Cross-sectional mean per step
    pub mean: Vec<f64>,
    /// 5th percentile per step
    pub p5: Vec<f64>,
    /// 95th percentile per step
    pub p95: Vec<f64>,
}

/// Projection of every variable over `time_steps`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesProjection {
    /// Number of projected steps
    pub time_steps: usize,
    /// Trajectories keyed by column name
    pub trajectories: BTreeMap<String, Trajectory>,
}

/// Projects each simulated value forward `time_steps` steps.
///
/// Each path starts at one simulated sample `x₀` and evolves as
///
/// ```text
/// x_{t} = x_{t−1} + κ (μ − x_{t−1}) + σ · δᵗ · ε_t,   ε_t ~ N(0, 1)
/// ```
///
/// with `μ`, `σ` the sample mean and standard deviation of the column,
/// `κ` the mean reversion and `δ` the volatility decay from `params`
/// (one entry per column, in column order).
pub fn project_time_series(
    samples: &SampleMatrix,
    params: &[TimeSeriesParams],
    time_steps: usize,
    rng: &mut SimRng,
) -> TimeSeriesProjection {
    let mut trajectories = BTreeMap::new();

    for (j, column) in samples.columns().iter().enumerate() {
        let p = params.get(j).copied().unwrap_or_default();
        let mu = mean(column);
        let sigma = std_dev(column);

        let mut paths = column.clone();
        let mut shocks = vec![0.0; paths.len()];
        let mut trajectory = Trajectory {
            mean: Vec::with_capacity(time_steps),
            p5: Vec::with_capacity(time_steps),
            p95: Vec::with_capacity(time_steps),
        };

        let mut vol = sigma;
        for _ in 0..time_steps {
            vol *= p.volatility_decay;
            rng.fill_normal(&mut shocks);
            for (x, eps) in paths.iter_mut().zip(&shocks) {
                *x += p.mean_reversion * (mu - *x) + vol * eps;
            }

            let sorted = SortedSamples::new(&paths);
            trajectory.mean.push(mean(&paths));
            trajectory.p5.push(sorted.percentile(5.0));
            trajectory.p95.push(sorted.percentile(95.0));
        }

        trajectories.insert(samples.name(j).to_string(), trajectory);
    }

    TimeSeriesProjection {
        time_steps,
        trajectories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn normal_column(n: usize, mu: f64, sigma: f64, seed: u64) -> Vec<f64> {
        let mut rng = SimRng::from_seed(seed);
        let mut z = vec![0.0; n];
        rng.fill_normal(&mut z);
        z.iter().map(|v| mu + sigma * v).collect()
    }

    #[test]
    fn test_shapes() {
        let samples = SampleMatrix::from_unnamed_columns(vec![
            normal_column(1_000, 0.0, 1.0, 1),
            normal_column(1_000, 5.0, 2.0, 2),
        ])
        .unwrap();
        let params = vec![TimeSeriesParams::default(); 2];
        let p = project_time_series(&samples, &params, 12, &mut SimRng::from_seed(3));

        assert_eq!(p.time_steps, 12);
        assert_eq!(p.trajectories.len(), 2);
        let t = &p.trajectories["variable_1"];
        assert_eq!(t.mean.len(), 12);
        assert!(t.p5.iter().zip(&t.p95).all(|(lo, hi)| lo <= hi));
    }

    #[test]
    fn test_mean_stays_at_long_run_level() {
        let samples =
            SampleMatrix::from_unnamed_columns(vec![normal_column(20_000, 10.0, 2.0, 5)]).unwrap();
        let params = [TimeSeriesParams {
            volatility_decay: 0.9,
            mean_reversion: 0.2,
        }];
        let p = project_time_series(&samples, &params, 20, &mut SimRng::from_seed(6));
        let t = &p.trajectories["variable_0"];
        assert!(t.mean.iter().all(|m| (m - 10.0).abs() < 0.1));
    }

    #[test]
    fn test_full_reversion_without_noise_collapses_band() {
        let samples = SampleMatrix::from_unnamed_columns(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let params = [TimeSeriesParams {
            volatility_decay: 0.0,
            mean_reversion: 1.0,
        }];
        let p = project_time_series(&samples, &params, 3, &mut SimRng::from_seed(1));
        let t = &p.trajectories["variable_0"];
        assert_relative_eq!(t.p5[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(t.p95[2], 2.0, epsilon = 1e-12);
    }
}
