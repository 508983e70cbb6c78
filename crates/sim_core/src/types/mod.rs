//! Core data types.
//!
//! This module provides:
//! - [`SampleMatrix`]: iterations × variables matrix of finite draws
//! - [`SampleSummary`]: compact shape/range summary of a sample matrix
//! - [`CoreError`]: structural errors raised when constructing samples

pub mod error;
pub mod samples;

pub use error::CoreError;
pub use samples::{SampleMatrix, SampleSummary};
