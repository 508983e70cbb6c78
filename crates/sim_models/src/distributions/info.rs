//! Distribution kinds and their descriptive metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DistributionError;

/// The supported distribution kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    /// Gaussian
    Normal,
    /// Log-normal, parameterised by the underlying normal
    Lognormal,
    /// Continuous uniform
    Uniform,
    /// Exponential, parameterised by scale (mean)
    Exponential,
    /// Gamma, shape/scale
    Gamma,
    /// Beta on (0, 1)
    Beta,
    /// Weibull, shape/scale
    Weibull,
    /// Poisson counts
    Poisson,
}

impl DistributionKind {
    /// Every kind, in registry order.
    pub const ALL: [DistributionKind; 8] = [
        Self::Normal,
        Self::Lognormal,
        Self::Uniform,
        Self::Exponential,
        Self::Gamma,
        Self::Beta,
        Self::Weibull,
        Self::Poisson,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Lognormal => "lognormal",
            Self::Uniform => "uniform",
            Self::Exponential => "exponential",
            Self::Gamma => "gamma",
            Self::Beta => "beta",
            Self::Weibull => "weibull",
            Self::Poisson => "poisson",
        }
    }

    /// Parameter names, in declaration order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            Self::Normal | Self::Lognormal => &["mean", "std"],
            Self::Uniform => &["low", "high"],
            Self::Exponential => &["scale"],
            Self::Gamma | Self::Weibull => &["shape", "scale"],
            Self::Beta => &["alpha", "beta"],
            Self::Poisson => &["lambda"],
        }
    }

    /// Whether the kind draws integer counts.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Poisson)
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistributionKind {
    type Err = DistributionError;

    /// Parses a registry name, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use sim_models::distributions::DistributionKind;
    ///
    /// assert_eq!("Gamma".parse::<DistributionKind>().unwrap(), DistributionKind::Gamma);
    /// assert!("cauchy".parse::<DistributionKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.name() == needle)
            .ok_or_else(|| DistributionError::UnknownDistribution(s.to_string()))
    }
}

/// Description of one distribution parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// What the parameter controls
    pub description: String,
    /// Valid domain, as text
    pub constraint: String,
}

/// Descriptive metadata for a distribution kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionInfo {
    /// Kind
    pub kind: DistributionKind,
    /// Registry name
    pub name: String,
    /// One-line description
    pub description: String,
    /// Parameters, in declaration order
    pub parameters: Vec<ParameterInfo>,
    /// Support of the distribution, as text
    pub support: String,
    /// Whether draws are integer counts
    pub discrete: bool,
}

fn param(name: &str, description: &str, constraint: &str) -> ParameterInfo {
    ParameterInfo {
        name: name.to_string(),
        description: description.to_string(),
        constraint: constraint.to_string(),
    }
}

/// Returns the metadata for `kind`.
pub fn get_distribution_info(kind: DistributionKind) -> DistributionInfo {
    let (description, parameters, support) = match kind {
        DistributionKind::Normal => (
            "Symmetric bell curve for additive noise and forecast errors",
            vec![
                param("mean", "Location of the centre", "finite"),
                param("std", "Standard deviation", "> 0"),
            ],
            "(-inf, inf)",
        ),
        DistributionKind::Lognormal => (
            "Right-skewed positive values such as costs and durations",
            vec![
                param("mean", "Mean of the underlying normal", "finite"),
                param("std", "Standard deviation of the underlying normal", "> 0"),
            ],
            "(0, inf)",
        ),
        DistributionKind::Uniform => (
            "Equal likelihood across a bounded range",
            vec![
                param("low", "Lower bound", "finite, < high"),
                param("high", "Upper bound", "finite, > low"),
            ],
            "[low, high)",
        ),
        DistributionKind::Exponential => (
            "Waiting times between independent events",
            vec![param("scale", "Mean waiting time", "> 0")],
            "[0, inf)",
        ),
        DistributionKind::Gamma => (
            "Positive skewed quantities such as aggregate losses",
            vec![
                param("shape", "Shape k", "> 0"),
                param("scale", "Scale theta", "> 0"),
            ],
            "(0, inf)",
        ),
        DistributionKind::Beta => (
            "Proportions, rates and probabilities",
            vec![
                param("alpha", "First shape parameter", "> 0"),
                param("beta", "Second shape parameter", "> 0"),
            ],
            "(0, 1)",
        ),
        DistributionKind::Weibull => (
            "Time to failure and component lifetimes",
            vec![
                param("shape", "Shape k", "> 0"),
                param("scale", "Scale lambda", "> 0"),
            ],
            "[0, inf)",
        ),
        DistributionKind::Poisson => (
            "Counts of events in a fixed interval",
            vec![param("lambda", "Expected count", "> 0")],
            "{0, 1, 2, ...}",
        ),
    };

    DistributionInfo {
        kind,
        name: kind.name().to_string(),
        description: description.to_string(),
        parameters,
        support: support.to_string(),
        discrete: kind.is_discrete(),
    }
}

/// Registry names of every supported distribution.
pub fn list_supported_distributions() -> Vec<&'static str> {
    DistributionKind::ALL.iter().map(|k| k.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in DistributionKind::ALL {
            assert_eq!(kind.name().parse::<DistributionKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = "pareto".parse::<DistributionKind>().unwrap_err();
        assert_eq!(err, DistributionError::UnknownDistribution("pareto".to_string()));
        assert_eq!(err.to_string(), "Unknown distribution: pareto");
    }

    #[test]
    fn test_info_matches_parameter_names() {
        for kind in DistributionKind::ALL {
            let info = get_distribution_info(kind);
            let names: Vec<&str> = info.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, kind.parameter_names());
            assert_eq!(info.discrete, kind == DistributionKind::Poisson);
        }
    }

    #[test]
    fn test_list_supported_distributions() {
        let names = list_supported_distributions();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"weibull"));
    }
}
