//! Model fitting.
//!
//! - `engine`: the regression engine contract and the GP engine
//! - `schedule`: coarse-to-fine warm-started fitting driver

pub mod engine;
pub mod schedule;

pub use engine::*;
pub use schedule::*;
