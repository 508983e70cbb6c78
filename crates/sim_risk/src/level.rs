//! Qualitative risk levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score above which a level is [`RiskLevel::Critical`].
pub const CRITICAL_THRESHOLD: f64 = 0.5;
/// Score above which a level is [`RiskLevel::High`].
pub const HIGH_THRESHOLD: f64 = 0.3;
/// Score above which a level is [`RiskLevel::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 0.1;

/// Four-step qualitative scale shared by prioritisation, stress aggregation
/// and the summary report.
///
/// Ordered from least to most severe, so `RiskLevel::Critical >
/// RiskLevel::Low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Routine monitoring
    Low,
    /// Watch closely
    Medium,
    /// Act soon
    High,
    /// Act now
    Critical,
}

impl RiskLevel {
    /// Maps a score onto a level with the 0.5 / 0.3 / 0.1 cut-offs.
    ///
    /// Cut-offs are exclusive: a score of exactly `0.5` is `High`.
    ///
    /// ```
    /// use sim_risk::RiskLevel;
    ///
    /// assert_eq!(RiskLevel::from_score(0.75), RiskLevel::Critical);
    /// assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
    /// assert_eq!(RiskLevel::from_score(0.05), RiskLevel::Low);
    /// ```
    pub fn from_score(score: f64) -> Self {
        if score > CRITICAL_THRESHOLD {
            Self::Critical
        } else if score > HIGH_THRESHOLD {
            Self::High
        } else if score > MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
