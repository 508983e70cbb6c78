//! Failure-mode analysis: severity levels, critical failures and trend.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sim_core::math::{linear_fit, SortedSamples};
use sim_core::SampleMatrix;
use std::collections::BTreeMap;

use crate::ensure_non_empty;
use crate::error::AnalysisError;

/// Number of sequential chunks used for trend detection.
pub const TREND_CHUNKS: usize = 10;
/// Trend detection needs strictly more samples than this.
pub const TREND_MIN_SAMPLES: usize = 100;
/// Slopes within this band are reported as stable.
pub const TREND_TOLERANCE: f64 = 1e-3;
/// Percentile a chunk's failures are counted against.
pub const TREND_PERCENTILE: f64 = 95.0;

/// Severity band of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Beyond the 99th percentile
    Critical,
    /// Beyond the 95th percentile
    High,
    /// Beyond the 90th percentile
    Medium,
    /// Beyond the 80th percentile
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Quantile that opens this band.
    pub fn quantile(&self) -> f64 {
        match self {
            Self::Critical => 0.99,
            Self::High => 0.95,
            Self::Medium => 0.90,
            Self::Low => 0.80,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical failure (worst 1%)",
            Self::High => "High-severity failure (worst 5%)",
            Self::Medium => "Medium-severity failure (worst 10%)",
            Self::Low => "Low-severity failure (worst 20%)",
        }
    }
}

/// Exceedance of one severity threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeverityLevel {
    /// Band
    pub severity: Severity,
    /// Sample quantile at the band's opening level
    pub threshold: f64,
    /// Fraction of samples strictly above `threshold`
    pub probability: f64,
    /// Number of samples strictly above `threshold`
    pub count: usize,
    /// Human-readable label
    pub label: String,
}

/// Samples beyond the 99th percentile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalFailures {
    /// 99th percentile
    pub threshold: f64,
    /// Samples strictly above `threshold`
    pub count: usize,
    /// `count / n`
    pub rate: f64,
    /// Largest sample
    pub worst_case: f64,
}

/// Direction of a failure-rate trend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Later chunks fail more often
    Increasing,
    /// Later chunks fail less often
    Decreasing,
    /// No slope beyond the tolerance
    Stable,
}

/// Linear trend of failure rates across sequential chunks of the sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureTrend {
    /// Classified direction
    pub direction: TrendDirection,
    /// Regression slope of rate on chunk index
    pub slope: f64,
    /// `|slope|`
    pub magnitude: f64,
    /// Exceedance rate of each chunk over the global 95th percentile
    pub chunk_rates: Vec<f64>,
}

/// Failure analysis of one variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureModes {
    /// One entry per [`Severity`], most severe first
    pub severity_levels: Vec<SeverityLevel>,
    /// Summary of the worst 1%
    pub critical_failures: CriticalFailures,
    /// Present only when there are more than [`TREND_MIN_SAMPLES`] samples
    pub trend: Option<FailureTrend>,
}

impl FailureModes {
    /// Analyses one column, in its original row order.
    pub fn from_values(values: &[f64]) -> Self {
        let sorted = SortedSamples::new(values);
        let n = values.len().max(1) as f64;

        let severity_levels = Severity::ALL
            .iter()
            .map(|&severity| {
                let threshold = sorted.quantile(severity.quantile());
                let probability = sorted.exceedance(threshold);
                SeverityLevel {
                    severity,
                    threshold,
                    probability,
                    count: exceed_count(&sorted, threshold),
                    label: severity.label().to_string(),
                }
            })
            .collect();

        let threshold = sorted.quantile(Severity::Critical.quantile());
        let count = exceed_count(&sorted, threshold);
        let critical_failures = CriticalFailures {
            threshold,
            count,
            rate: count as f64 / n,
            worst_case: sorted.max(),
        };

        let trend = (values.len() > TREND_MIN_SAMPLES)
            .then(|| failure_trend(values, sorted.percentile(TREND_PERCENTILE)));

        Self {
            severity_levels,
            critical_failures,
            trend,
        }
    }

    /// Level for `severity`.
    pub fn level(&self, severity: Severity) -> Option<&SeverityLevel> {
        self.severity_levels.iter().find(|l| l.severity == severity)
    }
}

fn exceed_count(sorted: &SortedSamples, threshold: f64) -> usize {
    let values = sorted.as_slice();
    values.len() - values.partition_point(|&v| v <= threshold)
}

/// Regresses per-chunk exceedance rates on the chunk index.
///
/// The last chunk absorbs the remainder when `values.len()` is not a
/// multiple of [`TREND_CHUNKS`].
fn failure_trend(values: &[f64], threshold: f64) -> FailureTrend {
    let chunk = values.len() / TREND_CHUNKS;
    let chunk_rates: Vec<f64> = (0..TREND_CHUNKS)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == TREND_CHUNKS {
                values.len()
            } else {
                start + chunk
            };
            let slice = &values[start..end];
            slice.iter().filter(|&&v| v > threshold).count() as f64 / slice.len().max(1) as f64
        })
        .collect();

    let index: Vec<f64> = (0..TREND_CHUNKS).map(|i| i as f64).collect();
    let slope = linear_fit(&index, &chunk_rates).slope;
    let direction = if slope > TREND_TOLERANCE {
        TrendDirection::Increasing
    } else if slope < -TREND_TOLERANCE {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    FailureTrend {
        direction,
        slope,
        magnitude: slope.abs(),
        chunk_rates,
    }
}

/// Per-variable failure analysis, keyed by column name.
///
/// # Errors
///
/// [`AnalysisError::EmptySamples`] for an empty matrix.
pub fn calculate_failure_modes(
    samples: &SampleMatrix,
) -> Result<BTreeMap<String, FailureModes>, AnalysisError> {
    ensure_non_empty(samples)?;

    let modes: Vec<FailureModes> = samples
        .columns()
        .par_iter()
        .map(|column| FailureModes::from_values(column))
        .collect();

    Ok(samples.names().iter().cloned().zip(modes).collect())
}
