//! Executive summary and recommendations.

use serde::{Deserialize, Serialize};
use sim_core::SampleMatrix;

use crate::error::AnalysisError;
use crate::level::RiskLevel;
use crate::prioritization::prioritize_risks;
use crate::risk_metrics::{calculate_risk_metrics, ThresholdSource};

/// Probability of failure above which a variable breaches its threshold.
pub const BREACH_PROBABILITY: f64 = 0.05;
/// `cvar_99 / var_99` ratio above which a tail is called heavy.
pub const HEAVY_TAIL_RATIO: f64 = 1.5;

/// One recommended action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Urgency
    pub priority: RiskLevel,
    /// Variable the action targets, if any
    pub variable: Option<String>,
    /// What to do
    pub action: String,
}

/// Headline view of a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Level of `average_var_95`
    pub overall_risk_level: RiskLevel,
    /// Mean of the per-variable `var_95`
    pub average_var_95: f64,
    /// Number of variables analysed
    pub variable_count: usize,
    /// Riskiest variable by composite score
    pub highest_priority_risk: Option<String>,
    /// Plain-language findings
    pub key_findings: Vec<String>,
    /// Recommended actions, most urgent first
    pub recommendations: Vec<Recommendation>,
}

/// Builds the executive summary.
///
/// The overall level applies the stress-aggregation cut-offs
/// (0.5 / 0.3 / 0.1) to the average 95% VaR. Recommendations are raised
/// for variables whose external failure threshold is exceeded more than
/// [`BREACH_PROBABILITY`] of the time and for heavy upper tails.
///
/// # Errors
///
/// Those of [`calculate_risk_metrics`] and [`prioritize_risks`].
pub fn generate_summary_report(
    samples: &SampleMatrix,
    thresholds: &[Option<f64>],
) -> Result<SummaryReport, AnalysisError> {
    let metrics = calculate_risk_metrics(samples, 0.95, thresholds)?;
    let prioritization = prioritize_risks(samples, thresholds)?;

    let variable_count = metrics.len();
    let average_var_95 =
        metrics.values().map(|m| m.var_95).sum::<f64>() / variable_count.max(1) as f64;
    let overall_risk_level = RiskLevel::from_score(average_var_95);
    let highest_priority_risk = prioritization.top().map(|s| s.variable.clone());

    let mut key_findings = vec![format!(
        "Average 95% VaR across {} variable(s) is {:.4} ({} risk)",
        variable_count, average_var_95, overall_risk_level
    )];
    if let Some(top) = prioritization.top() {
        key_findings.push(format!(
            "{} carries the highest composite risk score ({:.4})",
            top.variable, top.score
        ));
    }

    let mut recommendations = Vec::new();
    let mut breaches = 0usize;
    for (name, m) in &metrics {
        if m.threshold_source == ThresholdSource::External
            && m.probability_of_failure > BREACH_PROBABILITY
        {
            breaches += 1;
            let priority = if m.probability_of_failure > 2.0 * BREACH_PROBABILITY {
                RiskLevel::Critical
            } else {
                RiskLevel::High
            };
            recommendations.push(Recommendation {
                priority,
                variable: Some(name.clone()),
                action: format!(
                    "Reduce exposure to {}: failure threshold {:.4} is exceeded in {:.1}% of iterations",
                    name,
                    m.failure_threshold,
                    100.0 * m.probability_of_failure
                ),
            });
        }
        if m.var_99 > 0.0 && m.cvar_99 > HEAVY_TAIL_RATIO * m.var_99 {
            recommendations.push(Recommendation {
                priority: RiskLevel::Medium,
                variable: Some(name.clone()),
                action: format!(
                    "Hedge the tail of {}: expected shortfall beyond the 99% VaR is {:.2}x the VaR",
                    name,
                    m.cvar_99 / m.var_99
                ),
            });
        }
    }
    if breaches > 0 {
        key_findings.push(format!(
            "{} variable(s) breach their failure threshold more than {:.0}% of the time",
            breaches,
            100.0 * BREACH_PROBABILITY
        ));
    }

    if overall_risk_level >= RiskLevel::High {
        recommendations.push(Recommendation {
            priority: overall_risk_level,
            variable: None,
            action: "Escalate the scenario for review and define mitigation plans for the critical bucket"
                .to_string(),
        });
    }
    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            priority: RiskLevel::Low,
            variable: None,
            action: "Maintain current controls and monitoring cadence".to_string(),
        });
    }
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

    Ok(SummaryReport {
        overall_risk_level,
        average_var_95,
        variable_count,
        highest_priority_risk,
        key_findings,
        recommendations,
    })
}
