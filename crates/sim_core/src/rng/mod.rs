//! # Random Number Generation
//!
//! Seeded random number generation for Monte Carlo sampling.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: Every generator is seeded; a run with a fixed base
//!   seed replays exactly
//! - **Stream independence**: Parallel sampling chunks derive their seeds
//!   from `(base_seed, chunk_index)` with SplitMix64, so no two chunks share
//!   a stream
//! - **Interoperability**: [`SimRng`] implements [`rand::RngCore`], so any
//!   `rand_distr` distribution can sample from it directly
//!
//! ## Module Structure
//!
//! - [`prng`]: Seeded PRNG wrapper
//! - [`seeding`]: Seed derivation for independent streams
//!
//! ## Usage Example
//!
//! ```rust
//! use sim_core::rng::{derive_seed, SimRng};
//!
//! let base = 12345;
//! let mut chunk_0 = SimRng::from_seed(derive_seed(base, 0));
//! let mut chunk_1 = SimRng::from_seed(derive_seed(base, 1));
//!
//! assert_ne!(chunk_0.gen_uniform(), chunk_1.gen_uniform());
//! ```

pub mod prng;
pub mod seeding;

pub use prng::SimRng;
pub use seeding::{derive_seed, splitmix64};
