//! Data sources other than input files.
//!
//! - `sample`: synthetic profiles for the `simulate` subcommand and tests

pub mod sample;

pub use sample::*;
