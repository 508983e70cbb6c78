//! Descriptive statistics per variable.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sim_core::math::{Moments, SortedSamples};
use sim_core::SampleMatrix;
use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::ensure_non_empty;

/// Percentile levels reported by [`calculate_statistics`].
pub const REPORTED_PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// The five reported percentiles of one variable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 5th percentile
    pub p5: f64,
    /// Lower quartile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// Upper quartile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
}

impl Percentiles {
    /// Reads [`REPORTED_PERCENTILES`] off a sorted sample.
    pub fn from_sorted(sorted: &SortedSamples) -> Self {
        let [p5, p25, p50, p75, p95] = REPORTED_PERCENTILES.map(|q| sorted.percentile(q));
        Self {
            p5,
            p25,
            p50,
            p75,
            p95,
        }
    }
}

/// Summary statistics of one variable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// 50th percentile
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Third standardised moment
    pub skewness: f64,
    /// Excess kurtosis
    pub kurtosis: f64,
    /// Reported percentiles
    pub percentiles: Percentiles,
}

impl VariableStatistics {
    /// Computes the statistics of one column.
    pub fn from_values(values: &[f64]) -> Self {
        let moments = Moments::compute(values);
        let sorted = SortedSamples::new(values);
        Self {
            mean: moments.mean,
            median: sorted.median(),
            std: moments.std_dev(),
            min: sorted.min(),
            max: sorted.max(),
            skewness: moments.skewness,
            kurtosis: moments.kurtosis,
            percentiles: Percentiles::from_sorted(&sorted),
        }
    }
}

/// Per-variable descriptive statistics, keyed by column name.
///
/// # Errors
///
/// [`AnalysisError::EmptySamples`] if the matrix has no rows.
pub fn calculate_statistics(
    samples: &SampleMatrix,
) -> Result<BTreeMap<String, VariableStatistics>, AnalysisError> {
    ensure_non_empty(samples)?;

    let stats: Vec<VariableStatistics> = samples
        .columns()
        .par_iter()
        .map(|column| VariableStatistics::from_values(column))
        .collect();

    Ok(samples.names().iter().cloned().zip(stats).collect())
}
