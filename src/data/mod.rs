//! # Storing of linear systems in memory
//!
//! This module provides the data structures the solver is built from: variables, rows and the
//! constraints layout code formulates. The algorithm operating on them lives in `algorithm`.
pub mod constraint;
pub mod linear_algebra;
pub mod number_types;
pub mod variable;
