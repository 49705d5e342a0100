//! `saxs-merge` library crate.
//!
//! Statistical merging of small-angle scattering profiles of one sample
//! recorded under different conditions. The pipeline runs five stages:
//! cleanup, fitting, rescaling, classification and merging.
//!
//! The binary (`saxs-merge`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the regression engine can be swapped behind [`fit::RegressionEngine`]

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod profile;
pub mod report;
pub mod stages;

#[cfg(test)]
mod test_support;
