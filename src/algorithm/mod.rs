//! # Algorithms
pub mod simplex;

/// Outcome of driving the simplex method to a fixed point.
///
/// This is determined as the result of an algorithm.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum OptimizationResult {
    /// No pivot improves the goal any further.
    Optimal,
    /// A row left out of its variable's range couldn't be repaired.
    Infeasible,
    /// An improving variable was found that no row bounds.
    Unbounded,
}
