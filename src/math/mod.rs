//! Mathematical utilities: kernels, least squares, simplex search and t-tests.

pub mod kernel;
pub mod ols;
pub mod simplex;
pub mod ttest;

pub use kernel::*;
pub use ols::*;
pub use simplex::*;
pub use ttest::*;
