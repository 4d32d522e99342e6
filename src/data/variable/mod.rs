//! # Variables
//!
//! Every unknown of the system, whether it is a layout position or an auxiliary variable
//! introduced by the solver, is identified by a small dense integer. Those integers are handed
//! out by the `VariableRegistry`, which also owns the per-variable bookkeeping.
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU32, Ordering};

pub use registry::{VariableRecord, VariableRegistry};
pub use strength::{Strength, StrengthVector};

pub mod registry;
pub mod strength;

/// Dense identifier of a variable within one session.
///
/// Identifiers are reused after a variable is released, which keeps row storage small. They are
/// only meaningful together with the registry that created them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VariableId(u32);

impl VariableId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the registry's backing array.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The role a variable plays in the tableau.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariableKind {
    /// A layout unknown that may take any value.
    Unrestricted,
    /// A non-negative variable turning an inequality into an equality.
    Slack,
    /// A non-negative variable measuring the violation of a soft constraint.
    Error,
    /// A variable pinned at zero, marking a required equality in the tableau.
    Constant,
    /// A non-negative variable without a modeling role, such as the artificial variable used to
    /// insert a row that has no natural subject.
    Unknown,
}

impl VariableKind {
    /// Whether the variable is bound to be non-negative.
    pub fn is_restricted(self) -> bool {
        !matches!(self, VariableKind::Unrestricted)
    }

    /// Whether a row may be solved for this variable when it is not a layout unknown.
    pub fn is_pivotable(self) -> bool {
        matches!(self, VariableKind::Slack | VariableKind::Error)
    }

    /// Whether the simplex method may bring this variable into the basis to improve the goal.
    pub fn can_enter(self) -> bool {
        matches!(self, VariableKind::Slack | VariableKind::Error | VariableKind::Unknown)
    }
}

impl Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            VariableKind::Unrestricted => "unrestricted",
            VariableKind::Slack => "slack",
            VariableKind::Error => "error",
            VariableKind::Constant => "constant",
            VariableKind::Unknown => "unknown",
        })
    }
}

/// Kinds that layout code may declare.
///
/// Each maps onto the `VariableKind` of the same name.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeclaredKind {
    /// Any value, such as the position of an edge.
    Unrestricted,
    /// Non-negative, such as a gap that may only grow.
    Slack,
    /// Non-negative, measuring the violation of a relation kept outside the solver.
    Error,
    /// Pinned at zero.
    Constant,
}

impl From<DeclaredKind> for VariableKind {
    fn from(kind: DeclaredKind) -> Self {
        match kind {
            DeclaredKind::Unrestricted => VariableKind::Unrestricted,
            DeclaredKind::Slack => VariableKind::Slack,
            DeclaredKind::Error => VariableKind::Error,
            DeclaredKind::Constant => VariableKind::Constant,
        }
    }
}

/// Identifies one solve session of one registry.
///
/// A new session starts whenever a registry is created or reset, so handles from an earlier
/// session or from another system are recognized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(u32);

static NEXT_SESSION: AtomicU32 = AtomicU32::new(0);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a variable, as held by code outside of the solver.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Variable {
    session: SessionId,
    id: VariableId,
    generation: u32,
}

impl Variable {
    pub(crate) fn new(session: SessionId, id: VariableId, generation: u32) -> Self {
        Self { session, id, generation }
    }

    /// The identifier within the session. Only unique while the handle is valid.
    pub fn id(&self) -> VariableId {
        self.id
    }

    pub(crate) fn session(&self) -> SessionId {
        self.session
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.id.fmt(f)
    }
}
