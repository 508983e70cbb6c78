//! Stress testing: five deterministic transformations of the sample.
//!
//! Each test rewrites the matrix and re-measures it. Column-wise tests keep
//! base and stressed figures per variable ([`VariableStress`]) and a signed
//! headline impact; the mean headline magnitude across tests sets the
//! overall level via [`RiskLevel::from_score`].

use serde::{Deserialize, Serialize};
use sim_core::math::{mean, pearson, SortedSamples};
use sim_core::rng::SimRng;
use sim_core::SampleMatrix;
use std::collections::BTreeMap;
use std::fmt;

use crate::ensure_non_empty;
use crate::error::AnalysisError;
use crate::level::RiskLevel;

/// Denominators below this switch relative changes to absolute ones.
const RELATIVE_FLOOR: f64 = 1e-12;

/// Tuning of the stress transformations.
///
/// The defaults are the canned scenario: market shock ×2, volatility ×3,
/// tail beyond p99 ×1.5, systemic dampening ×0.5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTestConfig {
    /// Seed for the correlation-breakdown permutation; entropy when `None`
    pub seed: Option<u64>,
    /// Multiplier applied to every sample in the market shock
    pub market_shock_factor: f64,
    /// Multiplier applied to deviations from the mean in the volatility spike
    pub volatility_multiplier: f64,
    /// Percentile above which tail events are amplified
    pub tail_percentile: f64,
    /// Multiplier applied to tail events
    pub tail_amplification: f64,
    /// Multiplier applied to every sample in the systemic scenario
    pub systemic_factor: f64,
}

impl Default for StressTestConfig {
    fn default() -> Self {
        Self {
            seed: None,
            market_shock_factor: 2.0,
            volatility_multiplier: 3.0,
            tail_percentile: 99.0,
            tail_amplification: 1.5,
            systemic_factor: 0.5,
        }
    }
}

impl StressTestConfig {
    /// Default factors with a fixed permutation seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Checks every factor is finite and the tail percentile in `(0, 100)`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let factors = [
            ("market_shock_factor", self.market_shock_factor),
            ("volatility_multiplier", self.volatility_multiplier),
            ("tail_amplification", self.tail_amplification),
            ("systemic_factor", self.systemic_factor),
        ];
        if let Some((name, value)) = factors.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::InvalidStressConfig(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        if !(self.tail_percentile > 0.0 && self.tail_percentile < 100.0) {
            return Err(AnalysisError::InvalidStressConfig(format!(
                "tail_percentile must lie in (0, 100), got {}",
                self.tail_percentile
            )));
        }
        Ok(())
    }
}

/// The canned stress tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressTestKind {
    /// Every sample scaled by the market shock factor
    ExtremeMarket,
    /// Columns independently permuted, destroying co-movement
    CorrelationBreakdown,
    /// Deviations from the mean amplified
    VolatilitySpike,
    /// Samples beyond the tail percentile amplified
    TailRiskEvents,
    /// Every sample dampened by the systemic factor
    SystemicRisk,
}

impl StressTestKind {
    /// All tests, in execution order.
    pub const ALL: [StressTestKind; 5] = [
        Self::ExtremeMarket,
        Self::CorrelationBreakdown,
        Self::VolatilitySpike,
        Self::TailRiskEvents,
        Self::SystemicRisk,
    ];

    /// Snake-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtremeMarket => "extreme_market",
            Self::CorrelationBreakdown => "correlation_breakdown",
            Self::VolatilitySpike => "volatility_spike",
            Self::TailRiskEvents => "tail_risk_events",
            Self::SystemicRisk => "systemic_risk",
        }
    }

    /// What the impact figure measures.
    pub fn measure(&self) -> &'static str {
        match self {
            Self::ExtremeMarket | Self::VolatilitySpike | Self::SystemicRisk => {
                "relative change in VaR 95%"
            }
            Self::CorrelationBreakdown => "absolute change in mean pairwise correlation",
            Self::TailRiskEvents => "relative change in the 99th percentile",
        }
    }

    fn headline(&self, stress: &VariableStress) -> f64 {
        match self {
            Self::TailRiskEvents => stress.p99_impact,
            _ => stress.var_impact,
        }
    }
}

impl fmt::Display for StressTestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base and stressed figures of one variable.
///
/// Shifts are `stressed − base`; impacts are the same change relative to
/// `|base|` (absolute when the base is ~0).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableStress {
    /// Mean before the stress
    pub base_mean: f64,
    /// Mean after the stress
    pub stressed_mean: f64,
    /// Relative change in the mean
    pub mean_impact: f64,
    /// 95th percentile before the stress
    pub base_var_95: f64,
    /// 95th percentile after the stress
    pub stressed_var_95: f64,
    /// `stressed_var_95 − base_var_95`
    pub var_shift: f64,
    /// Relative change in VaR 95%
    pub var_impact: f64,
    /// 99th percentile before the stress
    pub base_p99: f64,
    /// 99th percentile after the stress
    pub stressed_p99: f64,
    /// `stressed_p99 − base_p99`
    pub p99_shift: f64,
    /// Relative change in the 99th percentile
    pub p99_impact: f64,
    /// Change in the fraction of samples above the base VaR 95%
    pub tail_probability_delta: f64,
}

impl VariableStress {
    fn measure(base: &[f64], stressed: &[f64]) -> Self {
        let before = SortedSamples::new(base);
        let after = SortedSamples::new(stressed);
        let (base_mean, stressed_mean) = (mean(base), mean(stressed));
        let (base_var_95, stressed_var_95) = (before.percentile(95.0), after.percentile(95.0));
        let (base_p99, stressed_p99) = (before.percentile(99.0), after.percentile(99.0));

        Self {
            base_mean,
            stressed_mean,
            mean_impact: relative_change(base_mean, stressed_mean),
            base_var_95,
            stressed_var_95,
            var_shift: stressed_var_95 - base_var_95,
            var_impact: relative_change(base_var_95, stressed_var_95),
            base_p99,
            stressed_p99,
            p99_shift: stressed_p99 - base_p99,
            p99_impact: relative_change(base_p99, stressed_p99),
            tail_probability_delta: after.exceedance(base_var_95) - before.exceedance(base_var_95),
        }
    }
}

/// Result of one stress test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StressTestOutcome {
    /// Test
    pub kind: StressTestKind,
    /// What `impact` measures
    pub measure: String,
    /// Mean headline magnitude over variables (non-negative)
    pub impact: f64,
    /// Signed headline impact per variable; empty for cross-variable tests
    pub variable_impacts: BTreeMap<String, f64>,
    /// Base and stressed figures per variable; empty for cross-variable tests
    pub variables: BTreeMap<String, VariableStress>,
}

/// All stress outcomes plus the aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StressTestReport {
    /// One outcome per [`StressTestKind`], in execution order
    pub tests: Vec<StressTestOutcome>,
    /// Mean impact magnitude
    pub aggregate_impact: f64,
    /// Level of `aggregate_impact`
    pub overall_risk: RiskLevel,
    /// Seed used for the permutation
    pub seed: u64,
}

impl StressTestReport {
    /// Outcome of `kind`.
    pub fn outcome(&self, kind: StressTestKind) -> Option<&StressTestOutcome> {
        self.tests.iter().find(|t| t.kind == kind)
    }
}

#[inline]
fn relative_change(base: f64, stressed: f64) -> f64 {
    if base.abs() > RELATIVE_FLOOR {
        (stressed - base) / base.abs()
    } else {
        stressed - base
    }
}

/// Mean pairwise Pearson correlation over distinct column pairs.
fn mean_pairwise_correlation(columns: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            total += pearson(&columns[i], &columns[j]);
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

/// Per-variable outcome of a column transformation.
fn per_variable<T>(kind: StressTestKind, samples: &SampleMatrix, transform: T) -> StressTestOutcome
where
    T: Fn(&[f64]) -> Vec<f64>,
{
    let mut variable_impacts = BTreeMap::new();
    let mut variables = BTreeMap::new();
    let mut total = 0.0;
    for (name, column) in samples.names().iter().zip(samples.columns()) {
        let stress = VariableStress::measure(column, &transform(column));
        let impact = kind.headline(&stress);
        total += impact.abs();
        variable_impacts.insert(name.clone(), impact);
        variables.insert(name.clone(), stress);
    }

    StressTestOutcome {
        kind,
        measure: kind.measure().to_string(),
        impact: total / samples.n_cols().max(1) as f64,
        variable_impacts,
        variables,
    }
}

fn correlation_breakdown(samples: &SampleMatrix, rng: &mut SimRng) -> StressTestOutcome {
    let baseline = mean_pairwise_correlation(samples.columns());
    let permuted: Vec<Vec<f64>> = samples
        .columns()
        .iter()
        .map(|column| {
            let mut shuffled = column.clone();
            rng.shuffle(&mut shuffled);
            shuffled
        })
        .collect();
    let stressed = mean_pairwise_correlation(&permuted);

    StressTestOutcome {
        kind: StressTestKind::CorrelationBreakdown,
        measure: StressTestKind::CorrelationBreakdown.measure().to_string(),
        impact: (stressed - baseline).abs(),
        variable_impacts: BTreeMap::new(),
        variables: BTreeMap::new(),
    }
}

/// Runs the five stress tests.
///
/// | test | transformation | headline impact |
/// |------|----------------|--------|
/// | `extreme_market` | `x · market_shock_factor` | relative VaR 95% change |
/// | `correlation_breakdown` | independent permutation per column | \|Δ mean pairwise correlation\| |
/// | `volatility_spike` | `μ + volatility_multiplier · (x − μ)` | relative VaR 95% change |
/// | `tail_risk_events` | `x · tail_amplification` for `x > p_tail` | relative p99 change |
/// | `systemic_risk` | `x · systemic_factor` | relative VaR 95% change |
///
/// Column-wise tests also report, per variable, the VaR 95% and p99
/// shifts, the mean impact and the tail-probability delta (see
/// [`VariableStress`]).
///
/// Marginals are preserved exactly by the permutation, so only the
/// cross-variable structure is stressed there.
///
/// # Errors
///
/// - [`AnalysisError::InvalidStressConfig`] if a factor is unusable
/// - [`AnalysisError::EmptySamples`] for an empty matrix
pub fn perform_stress_tests(
    samples: &SampleMatrix,
    config: &StressTestConfig,
) -> Result<StressTestReport, AnalysisError> {
    config.validate()?;
    ensure_non_empty(samples)?;

    let mut rng = match config.seed {
        Some(seed) => SimRng::from_seed(seed),
        None => SimRng::from_entropy(),
    };

    let tests = vec![
        per_variable(StressTestKind::ExtremeMarket, samples, |x| {
            x.iter().map(|v| v * config.market_shock_factor).collect()
        }),
        correlation_breakdown(samples, &mut rng),
        per_variable(StressTestKind::VolatilitySpike, samples, |x| {
            let mu = mean(x);
            x.iter()
                .map(|v| mu + config.volatility_multiplier * (v - mu))
                .collect()
        }),
        per_variable(StressTestKind::TailRiskEvents, samples, |x| {
            let cut = SortedSamples::new(x).percentile(config.tail_percentile);
            x.iter()
                .map(|&v| if v > cut { v * config.tail_amplification } else { v })
                .collect()
        }),
        per_variable(StressTestKind::SystemicRisk, samples, |x| {
            x.iter().map(|v| v * config.systemic_factor).collect()
        }),
    ];

    let aggregate_impact = tests.iter().map(|t| t.impact).sum::<f64>() / tests.len() as f64;

    Ok(StressTestReport {
        tests,
        aggregate_impact,
        overall_risk: RiskLevel::from_score(aggregate_impact),
        seed: rng.seed(),
    })
}
