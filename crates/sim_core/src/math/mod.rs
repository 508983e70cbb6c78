//! Descriptive statistics kernels.
//!
//! All kernels operate on plain `&[f64]` slices so they can be applied to
//! [`SampleMatrix`](crate::SampleMatrix) columns without copying.
//!
//! ## Conventions
//!
//! - Moments are population moments (divide by `n`).
//! - Percentiles use linear interpolation between closest ranks:
//!   `idx = q / 100 · (n − 1)`.
//! - Degenerate inputs (zero variance, fewer than two points) return `0.0`
//!   for shape and association measures rather than NaN.

pub mod association;
pub mod moments;
pub mod quantiles;

pub use association::{linear_fit, pearson, ranks, spearman, LinearFit};
pub use moments::{mean, std_dev, variance, Moments};
pub use quantiles::{tail_mean, SortedSamples};
