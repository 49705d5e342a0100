//! Input/output helpers.
//!
//! - profile ingest + validation (`ingest`)
//! - data and mean-curve text files (`export`)
//! - merged curve JSON (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
