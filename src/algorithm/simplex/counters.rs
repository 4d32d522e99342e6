//! # Diagnostic counters
//!
//! Advisory statistics about the work a system did. Nothing reads them to make decisions.
use std::fmt::{self, Display};

/// Cumulative counts since the system was created.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Counters {
    /// Constraints that made it into the tableau.
    pub constraints_added: u64,
    /// Constraints withdrawn again.
    pub constraints_removed: u64,
    /// Required constraints rejected as contradictory.
    pub unsatisfiable: u64,
    /// Insertions that needed a phase one through an artificial variable.
    pub artificial_insertions: u64,
    /// Primal simplex pivots, both phases.
    pub pivots: u64,
    /// Pivots done to repair rows with a negative constant.
    pub dual_pivots: u64,
    /// Calls to `resolve`.
    pub resolves: u64,
    /// Session resets.
    pub resets: u64,
}

impl Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} added, {} removed, {} unsatisfiable, {} artificial, {} pivots, {} dual pivots, {} resolves, {} resets",
            self.constraints_added,
            self.constraints_removed,
            self.unsatisfiable,
            self.artificial_insertions,
            self.pivots,
            self.dual_pivots,
            self.resolves,
            self.resets,
        )
    }
}
