//! # Error reporting
//!
//! Two classes of problems can be reported by the solver. Usage errors mean that an invariant was
//! broken upstream, for example a handle that outlived its session was passed back in. An
//! unsatisfiable constraint is the infeasibility signal: the layout logic may drop the offending
//! constraint and continue with the tableau as it was before the call.
use thiserror::Error;

use crate::data::variable::VariableId;

/// Everything that can go wrong while building or solving a linear system.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The handle was created by a different system, or before the last reset.
    #[error("variable {0} belongs to another solve session")]
    ForeignVariable(VariableId),
    /// The handle was released and its identifier may have been reused.
    #[error("variable {0} was released")]
    StaleVariable(VariableId),
    /// The variable still appears in the tableau and can't be released.
    #[error("variable {0} is still used by a constraint")]
    VariableInUse(VariableId),
    /// The constraint handle is not (or no longer) known to this system.
    #[error("constraint {0} is not part of this system")]
    UnknownConstraint(u32),
    /// A row was asked to solve for a variable it doesn't contain.
    #[error("can't pivot on variable {variable}: its coefficient is zero")]
    ZeroPivot {
        /// Variable that should have entered the basis.
        variable: VariableId,
    },
    /// A required constraint contradicts the constraints already in the tableau.
    ///
    /// The tableau is left as it was before the constraint was offered.
    #[error("required constraint can't be satisfied")]
    Unsatisfiable,
    /// Strength levels are numbered from zero up to (not including) the number of levels.
    #[error("there is no strength level {0}")]
    InvalidStrength(usize),
    /// The tableau lost one of its invariants.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl SolverError {
    /// Whether this error indicates a programming error, rather than an infeasible system.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, SolverError::Unsatisfiable)
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;
