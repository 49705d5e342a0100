//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - stage options (`CleanupOptions`, `RescalingOptions`, ...)
//! - configuration enums (`Reference`, `GammaModel`, `OutputLevel`)
//! - fitting schedules and regression hyperparameters

pub mod types;

pub use types::*;
