//! Regression models.
//!
//! `gp` is the Gaussian Process used by the default engine.

pub mod gp;

pub use gp::GaussianProcess;
