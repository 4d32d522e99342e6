//! # Number types
//!
//! Tableau rows are computed with `f64`. Where a relation between two dimensions needs to be
//! expressed exactly before it is lowered into a row, the `Amount` fraction is used.
pub use amount::Amount;

pub mod amount;
