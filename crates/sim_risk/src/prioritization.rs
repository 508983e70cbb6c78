//! Composite risk scoring and priority buckets.

use serde::{Deserialize, Serialize};
use sim_core::math::{std_dev, SortedSamples};
use sim_core::SampleMatrix;

use crate::error::AnalysisError;
use crate::level::RiskLevel;
use crate::risk_metrics::resolve_threshold;
use crate::{check_thresholds, ensure_non_empty, threshold_at};

/// Weight of the standard deviation in the composite score.
pub const WEIGHT_VOLATILITY: f64 = 0.3;
/// Weight of the tail spread `p99 − p95`.
pub const WEIGHT_TAIL: f64 = 0.3;
/// Weight of the probability of failure.
pub const WEIGHT_FAILURE: f64 = 0.2;
/// Weight of the worst observed sample.
pub const WEIGHT_IMPACT: f64 = 0.2;

/// Share of variables placed in each of the critical, high and medium
/// buckets.
pub const BUCKET_SHARE: f64 = 0.2;

/// Composite score of one variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Column name
    pub variable: String,
    /// Weighted composite score
    pub score: f64,
    /// 1-based rank, 1 being the riskiest
    pub rank: usize,
    /// Bucket
    pub priority: RiskLevel,
    /// Population standard deviation
    pub volatility: f64,
    /// `p99 − p95`
    pub tail_spread: f64,
    /// Fraction strictly above the failure threshold
    pub probability_of_failure: f64,
    /// Largest sample
    pub impact: f64,
}

impl RiskScore {
    fn from_values(variable: &str, values: &[f64], threshold: Option<f64>) -> Self {
        let sorted = SortedSamples::new(values);
        let volatility = std_dev(values);
        let tail_spread = sorted.percentile(99.0) - sorted.percentile(95.0);
        let (failure_threshold, _) = resolve_threshold(&sorted, threshold);
        let probability_of_failure = sorted.exceedance(failure_threshold);
        let impact = sorted.max();

        Self {
            variable: variable.to_string(),
            score: WEIGHT_VOLATILITY * volatility
                + WEIGHT_TAIL * tail_spread
                + WEIGHT_FAILURE * probability_of_failure
                + WEIGHT_IMPACT * impact,
            rank: 0,
            priority: RiskLevel::Low,
            volatility,
            tail_spread,
            probability_of_failure,
            impact,
        }
    }
}

/// Ranked scores and the four priority buckets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskPrioritization {
    /// All variables, riskiest first
    pub ranking: Vec<RiskScore>,
    /// Names in the critical bucket
    pub critical: Vec<String>,
    /// Names in the high bucket
    pub high: Vec<String>,
    /// Names in the medium bucket
    pub medium: Vec<String>,
    /// Names in the low bucket
    pub low: Vec<String>,
}

impl RiskPrioritization {
    /// The riskiest variable.
    pub fn top(&self) -> Option<&RiskScore> {
        self.ranking.first()
    }

    /// Names in the bucket for `level`.
    pub fn bucket(&self, level: RiskLevel) -> &[String] {
        match level {
            RiskLevel::Critical => &self.critical,
            RiskLevel::High => &self.high,
            RiskLevel::Medium => &self.medium,
            RiskLevel::Low => &self.low,
        }
    }
}

/// Bucket sizes `[critical, high, medium, low]` for `n` variables.
///
/// Each of the first three buckets takes `⌈0.2·n⌉`, clamped to what is
/// left; the low bucket takes the remainder.
///
/// ```
/// use sim_risk::prioritization::bucket_sizes;
///
/// assert_eq!(bucket_sizes(10), [2, 2, 2, 4]);
/// assert_eq!(bucket_sizes(3), [1, 1, 1, 0]);
/// assert_eq!(bucket_sizes(1), [1, 0, 0, 0]);
/// ```
pub fn bucket_sizes(n: usize) -> [usize; 4] {
    let per_bucket = (BUCKET_SHARE * n as f64).ceil() as usize;
    let mut remaining = n;
    let mut sizes = [0; 4];
    for size in sizes.iter_mut().take(3) {
        *size = per_bucket.min(remaining);
        remaining -= *size;
    }
    sizes[3] = remaining;
    sizes
}

/// Scores every variable and sorts them into priority buckets.
///
/// `score = 0.3·std + 0.3·(p99 − p95) + 0.2·probability_of_failure +
/// 0.2·max`. Ties keep column order.
///
/// # Errors
///
/// - [`AnalysisError::ThresholdCount`] if `thresholds` has the wrong length
/// - [`AnalysisError::EmptySamples`] for an empty matrix
pub fn prioritize_risks(
    samples: &SampleMatrix,
    thresholds: &[Option<f64>],
) -> Result<RiskPrioritization, AnalysisError> {
    ensure_non_empty(samples)?;
    check_thresholds(samples, thresholds)?;

    let mut ranking: Vec<RiskScore> = (0..samples.n_cols())
        .map(|j| RiskScore::from_values(samples.name(j), samples.column(j), threshold_at(thresholds, j)))
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));

    let sizes = bucket_sizes(ranking.len());
    let levels = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
    ];
    let mut buckets: [Vec<String>; 4] = Default::default();

    let mut assigned = levels
        .iter()
        .zip(sizes)
        .flat_map(|(&level, size)| std::iter::repeat(level).take(size));
    for (i, score) in ranking.iter_mut().enumerate() {
        score.rank = i + 1;
        score.priority = assigned.next().unwrap_or(RiskLevel::Low);
        let slot = levels.iter().position(|&l| l == score.priority).unwrap_or(3);
        buckets[slot].push(score.variable.clone());
    }

    let [critical, high, medium, low] = buckets;
    Ok(RiskPrioritization {
        ranking,
        critical,
        high,
        medium,
        low,
    })
}
