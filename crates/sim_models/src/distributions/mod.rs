//! Distribution Library.
//!
//! A closed set of marginal distributions, each variant carrying its typed
//! parameter payload:
//!
//! | Kind          | Parameters            | Support        |
//! |---------------|-----------------------|----------------|
//! | `normal`      | `mean`, `std`         | ℝ              |
//! | `lognormal`   | `mean`, `std` (of ln) | (0, ∞)         |
//! | `uniform`     | `low`, `high`         | [low, high)    |
//! | `exponential` | `scale`               | [0, ∞)         |
//! | `gamma`       | `shape`, `scale`      | (0, ∞)         |
//! | `beta`        | `alpha`, `beta`       | (0, 1)         |
//! | `weibull`     | `shape`, `scale`      | [0, ∞)         |
//! | `poisson`     | `lambda`              | {0, 1, 2, ...} |
//!
//! ## Usage
//!
//! ```
//! use sim_core::rng::SimRng;
//! use sim_models::distributions::Distribution;
//!
//! let dist = Distribution::Normal { mean: 100.0, std: 15.0 };
//! let mut rng = SimRng::from_seed(42);
//! let draws = dist.sample(1_000, &mut rng).unwrap();
//! assert_eq!(draws.len(), 1_000);
//!
//! assert!((dist.quantile(0.5).unwrap() - 100.0).abs() < 1e-9);
//! ```

mod distribution;
pub mod error;
mod info;
pub mod special;
mod variable;

pub use distribution::{Distribution, PROBABILITY_CLAMP};
pub use error::DistributionError;
pub use info::{
    get_distribution_info, list_supported_distributions, DistributionInfo, DistributionKind,
    ParameterInfo,
};
pub use variable::{sample_variables, VariableDefinition};
