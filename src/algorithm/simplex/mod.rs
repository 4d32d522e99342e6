//! # The simplex algorithm
//!
//! An incremental variant of the simplex method, in the style of the Cassowary family of layout
//! solvers. Constraints are inserted one at a time: each becomes a single row of the tableau,
//! expressed in the variables that are non-basic at that moment, and the goal is re-optimized
//! from the previous optimum. Removing a constraint pivots the variable that marks it into the
//! basis and drops its row.
//!
//! Each constraint leaves a marker variable in the tableau to identify its row later on: the
//! slack of an inequality, the (positive) error variable of a soft equality or a variable pinned
//! at zero for a required equality.
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::iter;

use fifo_set::FIFOSet;
use log::{debug, warn};

use crate::algorithm::OptimizationResult;
use crate::algorithm::simplex::counters::Counters;
use crate::algorithm::simplex::goal::Goal;
use crate::algorithm::simplex::logic::Objective;
use crate::data::constraint::{Constraint, Relation};
use crate::data::linear_algebra::row::{Row, RowId};
use crate::data::linear_algebra::storage::RowStorage;
use crate::data::variable::{SessionId, Strength, StrengthVector, VariableId, VariableKind, VariableRegistry};
use crate::error::{Result, SolverError};
use crate::settings::Settings;

pub mod counters;
pub mod goal;
mod logic;
mod session;

/// Life cycle of a system between resets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Nothing declared since creation or the last reset.
    Empty,
    /// Constraints were added or removed since values were last resolved.
    Building,
    /// A pivot loop is running.
    Optimizing,
    /// Values in the registry are those of the current tableau.
    Solved,
}

/// Refers to a constraint in the system that accepted it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ConstraintHandle {
    session: SessionId,
    id: u32,
}

impl ConstraintHandle {
    /// Number of the constraint within its session.
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Display for ConstraintHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c{}", self.id)
    }
}

/// The variables a constraint added to the tableau.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Tag {
    marker: VariableId,
    /// The second error variable of a soft constraint.
    other: Option<VariableId>,
    strength: Option<Strength>,
}

impl Tag {
    fn variables(&self) -> impl Iterator<Item=VariableId> {
        iter::once(self.marker).chain(self.other)
    }
}

/// How a new row enters the basis.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Subject {
    /// Solve the row for this variable.
    Variable(VariableId),
    /// No variable can be solved for without losing feasibility, do a phase one.
    Artificial,
    /// The row reads `0 = c` for a non-zero `c`.
    Contradiction,
}

/// A tableau of rows with a lexicographic goal, kept optimal as constraints come and go.
pub struct LinearSystem {
    settings: Settings,
    registry: VariableRegistry,

    /// Row arena, indexed by `RowId`. Dropped rows leave a hole that `free_rows` hands out again.
    rows: Vec<Option<Row>>,
    free_rows: Vec<RowId>,

    goal: Goal,
    /// Phase one objective, only present while a row is inserted through an artificial variable.
    artificial: Option<Goal>,

    constraints: BTreeMap<u32, Tag>,
    next_constraint: u32,
    /// Rows with a restricted basic variable that went negative during a substitution.
    infeasible_rows: FIFOSet<RowId>,

    state: State,
    counters: Counters,
}

impl LinearSystem {
    /// Create an empty system with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create an empty system.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            registry: VariableRegistry::new(),

            rows: Vec::new(),
            free_rows: Vec::new(),

            goal: Goal::new(),
            artificial: None,

            constraints: BTreeMap::new(),
            next_constraint: 0,
            infeasible_rows: iter::empty().collect(),

            state: State::Empty,
            counters: Counters::default(),
        }
    }

    /// Settings the system was created with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where the system is in its life cycle.
    pub fn state(&self) -> State {
        self.state
    }

    /// Work done since the system was created.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The variables of the current session.
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Number of rows in the tableau.
    pub fn nr_rows(&self) -> usize {
        self.rows.len() - self.free_rows.len()
    }

    /// Number of constraints in the system.
    pub fn nr_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Add a constraint and re-optimize.
    ///
    /// # Errors
    ///
    /// A usage error if the constraint mentions a variable of another session or a released one.
    /// `Unsatisfiable` if the constraint is required and contradicts the required constraints
    /// already present, in which case the system is left as it was.
    pub fn add_constraint(&mut self, constraint: &Constraint) -> Result<ConstraintHandle> {
        let terms = constraint.expression().terms().iter()
            .map(|&(coefficient, variable)| Ok((coefficient, self.registry.resolve(variable)?)))
            .collect::<Result<Vec<_>>>()?;

        self.state = State::Building;
        let id = self.next_constraint;
        let (mut row, tag) = self.create_row(id, constraint, &terms)?;

        match self.choose_subject(&row, &tag) {
            Subject::Variable(subject) => {
                row.solve_for(subject)?;
                self.substitute(subject, &row);
                self.insert_row(row);
            },
            Subject::Artificial => {
                self.counters.artificial_insertions += 1;
                if let Err(error) = self.add_with_artificial_variable(row) {
                    self.discard(&tag);
                    if error == SolverError::Unsatisfiable {
                        self.counters.unsatisfiable += 1;
                        warn!("rejected unsatisfiable constraint {}", constraint);
                    }
                    return Err(error);
                }
            },
            Subject::Contradiction => {
                self.discard(&tag);
                self.counters.unsatisfiable += 1;
                warn!("rejected contradictory constraint {}", constraint);
                return Err(SolverError::Unsatisfiable);
            },
        }

        self.next_constraint += 1;
        self.constraints.insert(id, tag);
        self.counters.constraints_added += 1;
        debug!("added constraint c{}: {}", id, constraint);

        self.reoptimize()?;
        Ok(ConstraintHandle { session: self.registry.session(), id })
    }

    /// Remove a constraint and re-optimize.
    ///
    /// # Errors
    ///
    /// `UnknownConstraint` if the handle isn't (or no longer) part of this system.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<()> {
        if handle.session != self.registry.session() {
            return Err(SolverError::UnknownConstraint(handle.id));
        }
        let tag = self.constraints.remove(&handle.id)
            .ok_or(SolverError::UnknownConstraint(handle.id))?;
        self.state = State::Building;

        self.remove_goal_effects(&tag)?;

        match self.registry[tag.marker].definition() {
            Some(id) => {
                self.remove_row(id)?;
            },
            None => {
                let id = self.select_marker_leaving_row(tag.marker)
                    .ok_or_else(|| SolverError::InternalInconsistency(format!(
                        "marker {} of constraint {} is in no row", tag.marker, handle,
                    )))?;
                let mut row = self.remove_row(id)?;
                let leaving = row.basic()
                    .ok_or_else(|| SolverError::InternalInconsistency(format!("row {} has no basic variable", id)))?;
                row.pivot(tag.marker, leaving)?;
                self.substitute(tag.marker, &row);
            },
        }

        for variable in tag.variables() {
            self.release_if_unreferenced(variable);
        }

        self.counters.constraints_removed += 1;
        debug!("removed constraint {}", handle);

        self.reoptimize()?;
        Ok(())
    }

    /// Current value of a variable: the constant of its row if it is basic, zero otherwise.
    pub fn value(&self, variable: VariableId) -> f64 {
        self.registry.get(variable)
            .and_then(|record| record.definition())
            .and_then(|id| self.rows.get(id.index()))
            .and_then(Option::as_ref)
            .map_or(0.0, Row::constant)
    }

    /// Drive the tableau to its optimum and store the value of every variable in its record.
    pub fn resolve(&mut self) -> Result<OptimizationResult> {
        let result = self.reoptimize()?;

        let rows = &self.rows;
        for (_, record) in self.registry.iter_mut() {
            let value = record.definition()
                .and_then(|id| rows.get(id.index()))
                .and_then(Option::as_ref)
                .map_or(0.0, Row::constant);
            record.set_value(value);
        }

        self.state = State::Solved;
        self.counters.resolves += 1;
        debug!(
            "resolved {} constraints in {} rows ({:?}), goal {}",
            self.constraints.len(), self.nr_rows(), result, self.goal.value(),
        );

        Ok(result)
    }

    /// Repair infeasible rows, then optimize the goal.
    fn reoptimize(&mut self) -> Result<OptimizationResult> {
        let repaired = self.dual_optimize()?;
        let optimized = self.optimize(Objective::Main)?;

        Ok(match repaired {
            OptimizationResult::Optimal => optimized,
            _ => repaired,
        })
    }

    /// Lower a constraint into a row over the current non-basic variables.
    ///
    /// Slack and error variables are created and the latter added to the goal. The row reads
    /// `0 = constant + Σ coefficient · variable` with a non-negative constant.
    fn create_row(
        &mut self,
        id: u32,
        constraint: &Constraint,
        terms: &[(f64, VariableId)],
    ) -> Result<(Row, Tag)> {
        let mut width = 2;
        for &(_, variable) in terms {
            width += match self.registry[variable].definition() {
                Some(definition) => row_in(&self.rows, definition)?.len(),
                None => 1,
            };
        }

        let mut row = Row::new(constraint.expression().constant(), self.settings.storage_for(width));
        for &(coefficient, variable) in terms {
            if coefficient == 0.0 {
                continue;
            }
            match self.registry[variable].definition() {
                Some(definition) => row.add_row(row_in(&self.rows, definition)?, coefficient),
                None => row.insert(variable, coefficient),
            }
        }

        let strength = constraint.strength();
        let tag = match constraint.relation() {
            relation @ (Relation::LessOrEqual | Relation::GreaterOrEqual) => {
                let coefficient = if relation == Relation::LessOrEqual { 1.0 } else { -1.0 };
                let slack = self.registry.create(format!("s{}", id), VariableKind::Slack).id();
                row.insert(slack, coefficient);

                let other = match strength {
                    Some(strength) => {
                        let error = self.registry.create_error(format!("e{}", id), strength).id();
                        row.insert(error, -coefficient);
                        self.goal.insert_variable(error, &StrengthVector::unit(strength), 1.0);
                        Some(error)
                    },
                    None => None,
                };

                Tag { marker: slack, other, strength }
            },
            Relation::Equal => match strength {
                Some(strength) => {
                    let plus = self.registry.create_error(format!("e{}+", id), strength).id();
                    let minus = self.registry.create_error(format!("e{}-", id), strength).id();
                    row.insert(plus, -1.0);
                    row.insert(minus, 1.0);
                    let unit = StrengthVector::unit(strength);
                    self.goal.insert_variable(plus, &unit, 1.0);
                    self.goal.insert_variable(minus, &unit, 1.0);

                    Tag { marker: plus, other: Some(minus), strength: Some(strength) }
                },
                None => {
                    let dummy = self.registry.create(format!("d{}", id), VariableKind::Constant).id();
                    row.insert(dummy, 1.0);

                    Tag { marker: dummy, other: None, strength: None }
                },
            },
        };

        if row.constant() < 0.0 {
            row.reverse_sign();
        }

        Ok((row, tag))
    }

    /// Pick the variable a new row gets solved for.
    ///
    /// Unrestricted variables come first. Otherwise, the constraint's own slack or error
    /// variable qualifies if its coefficient is negative: the row then yields a non-negative
    /// value for it. A row containing only pinned variables is either redundant or
    /// contradictory.
    fn choose_subject(&self, row: &Row, tag: &Tag) -> Subject {
        let terms = row.terms().to_vec();

        if let Some(&(variable, _)) = terms.iter()
            .find(|&&(variable, _)| self.registry[variable].kind() == VariableKind::Unrestricted) {
            return Subject::Variable(variable);
        }

        for candidate in tag.variables() {
            if self.registry[candidate].kind().is_pivotable() && row.coefficient(candidate) < 0.0 {
                return Subject::Variable(candidate);
            }
        }

        if terms.iter().all(|&(variable, _)| self.registry[variable].kind() == VariableKind::Constant) {
            if row.constant() != 0.0 {
                Subject::Contradiction
            } else {
                Subject::Variable(tag.marker)
            }
        } else {
            Subject::Artificial
        }
    }

    fn tag(&self, handle: ConstraintHandle) -> Result<&Tag> {
        if handle.session != self.registry.session() {
            return Err(SolverError::UnknownConstraint(handle.id));
        }
        self.constraints.get(&handle.id).ok_or(SolverError::UnknownConstraint(handle.id))
    }

    /// Undo the goal contributions of a constraint's error variables.
    fn remove_goal_effects(&mut self, tag: &Tag) -> Result<()> {
        for variable in tag.variables() {
            let vector = match self.registry[variable].strength_vector() {
                Some(vector) => *vector,
                None => continue,
            };
            match self.registry[variable].definition() {
                Some(id) => self.goal.insert_row(row_in(&self.rows, id)?, &vector, -1.0),
                None => self.goal.insert_variable(variable, &vector, -1.0),
            }
        }

        Ok(())
    }

    /// Forget the variables of a constraint that never made it into the tableau.
    fn discard(&mut self, tag: &Tag) {
        for variable in tag.variables() {
            self.goal.remove(variable);
            self.registry.release_id(variable);
        }
    }

    fn is_referenced(&self, variable: VariableId) -> bool {
        self.registry[variable].definition().is_some()
            || self.goal.coefficient(variable).is_some()
            || self.rows.iter().flatten().any(|row| row.terms().contains(variable))
    }

    /// Release a variable the tableau no longer mentions.
    ///
    /// The second error variable of a removed soft constraint can remain in other rows, it is
    /// kept until the next reset in that case.
    fn release_if_unreferenced(&mut self, variable: VariableId) {
        if !self.is_referenced(variable) {
            self.registry.release_id(variable);
        }
    }

    fn insert_row(&mut self, row: Row) -> RowId {
        let basic = row.basic();
        let id = match self.free_rows.pop() {
            Some(id) => {
                self.rows[id.index()] = Some(row);
                id
            },
            None => {
                self.rows.push(Some(row));
                RowId::new((self.rows.len() - 1) as u32)
            },
        };
        if let Some(basic) = basic {
            self.registry[basic].set_definition(Some(id));
        }

        id
    }

    /// Take a row out of the arena temporarily. Has to be followed by `restore_row`.
    fn take_row(&mut self, id: RowId) -> Result<Row> {
        self.rows.get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| SolverError::InternalInconsistency(format!("row {} is missing", id)))
    }

    fn restore_row(&mut self, id: RowId, row: Row) {
        if let Some(basic) = row.basic() {
            self.registry[basic].set_definition(Some(id));
        }
        self.rows[id.index()] = Some(row);
    }

    /// Drop a row for good. Its basic variable becomes non-basic.
    fn remove_row(&mut self, id: RowId) -> Result<Row> {
        let row = self.take_row(id)?;
        self.free_rows.push(id);
        if let Some(basic) = row.basic() {
            self.registry[basic].set_definition(None);
        }

        Ok(row)
    }
}

impl Default for LinearSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn row_in(rows: &[Option<Row>], id: RowId) -> Result<&Row> {
    rows.get(id.index())
        .and_then(Option::as_ref)
        .ok_or_else(|| SolverError::InternalInconsistency(format!("row {} is missing", id)))
}

impl Display for LinearSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.goal.describe(&self.registry))?;
        for (index, row) in self.rows.iter().enumerate() {
            if let Some(row) = row {
                writeln!(f, "{}: {}", RowId::new(index as u32), row.describe(&self.registry))?;
            }
        }
        Ok(())
    }
}
