//! Scenario Generator.
//!
//! Typed scenario configurations, the six preset templates and scenario
//! validation.
//!
//! ## Usage
//!
//! ```
//! use sim_models::scenarios::{generate_scenario, ScenarioTemplate, TemplateOverrides};
//!
//! let config = generate_scenario(
//!     ScenarioTemplate::RiskAssessment,
//!     &TemplateOverrides::default(),
//!     None,
//! )
//! .unwrap();
//!
//! let names: Vec<&str> = config.variables.iter().map(|v| v.name.as_str()).collect();
//! assert_eq!(names, ["operational_risk", "market_risk", "credit_risk"]);
//! assert_eq!(config.correlation_matrix.dim(), 3);
//! ```

mod config;
mod error;
mod templates;
mod time_series;

pub use config::{
    validate_scenario, DataBinding, FeatureFlags, ScenarioConfig, ScenarioConfigBuilder,
    TimeSeriesParams, TimeSeriesSpec, MAX_TIME_STEPS,
};
pub use error::ScenarioError;
pub use templates::{generate_scenario, ScenarioTemplate, TemplateOverrides};
pub use time_series::generate_time_series_scenario;
