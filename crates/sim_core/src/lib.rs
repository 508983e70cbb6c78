//! # sim_core: Foundation Layer for the Stratos Simulation Core
//!
//! ## Layer 1 (Foundation) Role
//!
//! sim_core is the bottom layer of the 4-layer architecture, providing:
//! - The immutable sample container [`SampleMatrix`] (`types::samples`)
//! - Descriptive statistics kernels: moments, percentiles, rank and
//!   linear association (`math`)
//! - Seeded, reproducible random number generation with independent
//!   per-chunk streams (`rng`)
//! - Error types: [`CoreError`] (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other sim_* crates, with minimal external
//! dependencies:
//! - rand / rand_distr: PRNG and standard normal sampling
//! - serde: Serialisation of sample matrices for the result cache
//! - thiserror: Error derivation
//!
//! ## Usage Examples
//!
//! ```rust
//! use sim_core::math::{mean, SortedSamples};
//! use sim_core::rng::SimRng;
//! use sim_core::SampleMatrix;
//!
//! let mut rng = SimRng::from_seed(42);
//! let mut column = vec![0.0; 1_000];
//! rng.fill_normal(&mut column);
//!
//! let samples = SampleMatrix::from_columns(vec!["x".to_string()], vec![column]).unwrap();
//! assert_eq!(samples.n_rows(), 1_000);
//!
//! let sorted = SortedSamples::new(samples.column(0));
//! assert!(sorted.percentile(95.0) > sorted.percentile(5.0));
//! assert!(mean(samples.column(0)).abs() < 0.2);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod rng;
pub mod types;

pub use types::{CoreError, SampleMatrix, SampleSummary};
