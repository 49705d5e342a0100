//! The five merge stages, in pipeline order.
//!
//! Each stage takes the profiles by value and returns them annotated:
//!
//! 1. `cleanup`: `agood`, `apvalue`
//! 2. `fitting`: interpolant + hyperparameters
//! 3. `rescaling`: `cgood`, gamma
//! 4. `classification`: `drefnum`, `drefname`, `dgood`, `dselfref`, `dpvalue`
//! 5. `merging`: the merged profile (`eorigin`, `eoriname`, `eextrapol`)

pub mod classification;
pub mod cleanup;
pub mod fitting;
pub mod merging;
pub mod rescaling;
