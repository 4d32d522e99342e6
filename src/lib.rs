//! # A linear constraint solver for relative layout
//!
//! Layout relations such as "this edge lies 5 pixels right of that one" are linear equalities and
//! inequalities, either required or soft with a strength. They are kept in a simplex tableau that
//! is updated incrementally as relations are added and removed, and soft relations are violated in
//! order of increasing strength when not everything can be satisfied.
#![warn(missing_docs)]

pub mod algorithm;
pub mod data;
pub mod error;
pub mod settings;

pub use crate::algorithm::OptimizationResult;
pub use crate::algorithm::simplex::{ConstraintHandle, LinearSystem, State};
pub use crate::data::constraint::{Constraint, Expression, Relation};
pub use crate::data::number_types::Amount;
pub use crate::data::variable::{DeclaredKind, Strength, Variable};
pub use crate::error::{Result, SolverError};
pub use crate::settings::{Settings, StorageChoice};

#[cfg(test)]
mod tests;
