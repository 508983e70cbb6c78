//! # sim_models (L2: Models)
//!
//! Random-variable models for the Stratos simulation core.
//!
//! This crate provides:
//! - The Distribution Library: a closed set of marginal distributions with
//!   sampling, CDFs and quantile functions (`distributions`)
//! - The Correlation Engine: correlation matrix validation, Cholesky
//!   factorisation, Gaussian and Student-t copula sampling, estimation and
//!   significance testing (`correlation`)
//! - The Scenario Generator: typed scenario configurations, preset
//!   templates and validation (`scenarios`)
//!
//! ## Design Principles
//!
//! - **Enum-based distributions and templates** for exhaustive matching;
//!   unknown names are rejected when parsed, never mid-simulation
//! - **Validate once**: a [`scenarios::ScenarioConfig`] that passes
//!   [`scenarios::validate_scenario`] can be sampled without further checks
//! - **Builder pattern** for ergonomic scenario construction

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod correlation;
pub mod distributions;
pub mod scenarios;

pub use correlation::{CholeskyFactor, Copula, CorrelationError, CorrelationMatrix};
pub use distributions::{Distribution, DistributionError, DistributionKind, VariableDefinition};
pub use scenarios::{ScenarioConfig, ScenarioError, ScenarioTemplate};
