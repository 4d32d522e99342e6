//! # Linear algebra primitives
//!
//! Sparse rows of the tableau and the containers backing them.
pub mod row;
pub mod storage;
