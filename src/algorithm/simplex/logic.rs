//! # High-level simplex logic
//!
//! The pivot loops: the primal method that improves the goal while keeping all restricted rows
//! feasible, the dual method that repairs rows gone negative while keeping the goal optimal, and
//! the phase one that inserts a row no variable can be solved for directly.
use log::{trace, warn};

use crate::algorithm::OptimizationResult;
use crate::algorithm::simplex::goal::Goal;
use crate::algorithm::simplex::{LinearSystem, State};
use crate::data::linear_algebra::row::{Row, RowId};
use crate::data::linear_algebra::storage::RowStorage;
use crate::data::variable::{Strength, VariableId, VariableKind, VariableRegistry};
use crate::error::{Result, SolverError};

/// Which objective a pivot loop minimizes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum Objective {
    /// The lexicographic goal of the soft constraints.
    Main,
    /// The phase one objective: the value of the artificial variable.
    Artificial,
}

impl LinearSystem {
    /// Pivot until the objective can't be improved any further.
    ///
    /// # Return value
    ///
    /// `Unbounded` if a variable improves the objective but no row limits its increase.
    pub(super) fn optimize(&mut self, objective: Objective) -> Result<OptimizationResult> {
        self.state = State::Optimizing;

        let result = loop {
            let goal = match objective {
                Objective::Main => &self.goal,
                Objective::Artificial => self.artificial.as_ref().ok_or_else(|| {
                    SolverError::InternalInconsistency("no artificial objective to optimize".to_string())
                })?,
            };

            match goal.select_pivot_column(&self.registry) {
                Some(entering) => match self.select_leaving_row(entering) {
                    Some(leaving) => {
                        self.pivot(entering, leaving)?;
                        self.counters.pivots += 1;
                    },
                    None => {
                        warn!("objective is unbounded in the direction of {}", entering);
                        break OptimizationResult::Unbounded;
                    },
                },
                None => break OptimizationResult::Optimal,
            }
        };

        self.state = State::Building;
        Ok(result)
    }

    /// Restore feasibility of the rows queued as infeasible.
    ///
    /// # Return value
    ///
    /// `Infeasible` if a row can't be repaired. That row stays queued.
    pub(super) fn dual_optimize(&mut self) -> Result<OptimizationResult> {
        while let Some(id) = self.infeasible_rows.pop() {
            let entering = match self.rows.get(id.index()).and_then(Option::as_ref) {
                // A pinned variable above zero can't be repaired by letting another variable grow
                Some(row) if is_infeasible(row, &self.registry) => if row.constant() < 0.0 {
                    self.goal.dual_entering(row, &self.registry)
                } else {
                    None
                },
                // Repaired or dropped in the meantime
                _ => continue,
            };

            match entering {
                Some(entering) => {
                    self.pivot(entering, id)?;
                    self.counters.dual_pivots += 1;
                },
                None => {
                    warn!("row {} can't be made feasible", id);
                    self.infeasible_rows.push(id);
                    return Ok(OptimizationResult::Infeasible);
                },
            }
        }

        Ok(OptimizationResult::Optimal)
    }

    /// Ratio test for the primal method.
    ///
    /// Only rows with a restricted basic variable limit the entering variable, and only when the
    /// entering variable has a negative coefficient in them. The row whose basic variable hits
    /// zero first leaves, ties go to the lowest row.
    fn select_leaving_row(&self, entering: VariableId) -> Option<RowId> {
        let mut best: Option<(RowId, f64)> = None;
        for (index, row) in self.rows.iter().enumerate() {
            let Some(row) = row else { continue };
            if !self.has_restricted_basic(row) {
                continue;
            }

            let coefficient = row.coefficient(entering);
            if coefficient < 0.0 {
                let ratio = -row.constant() / coefficient;
                if best.is_none_or(|(_, current)| ratio < current) {
                    best = Some((RowId::new(index as u32), ratio));
                }
            }
        }

        best.map(|(id, _)| id)
    }

    /// Choose the row through which a marker enters the basis when its constraint is removed.
    ///
    /// In order of preference: a row of a redundant required equality, a restricted row where
    /// the marker has a negative coefficient with minimal ratio, a restricted row with minimal
    /// ratio otherwise, and finally a row with an unrestricted basic variable.
    ///
    /// The row of a redundant equality only mentions pinned variables and has a zero constant.
    /// Pivoting through it leaves every other row's constant as it is, while dropping any other
    /// row would leave the redundant one to pin its basic variable at a non-zero value.
    pub(super) fn select_marker_leaving_row(&self, marker: VariableId) -> Option<RowId> {
        let mut negative: Option<(RowId, f64)> = None;
        let mut positive: Option<(RowId, f64)> = None;
        let mut unrestricted = None;

        for (index, row) in self.rows.iter().enumerate() {
            let Some(row) = row else { continue };
            let coefficient = row.coefficient(marker);
            if coefficient == 0.0 {
                continue;
            }

            let id = RowId::new(index as u32);
            let kind = row.basic().map(|basic| self.registry[basic].kind());
            if kind == Some(VariableKind::Constant) {
                return Some(id);
            } else if !self.has_restricted_basic(row) {
                unrestricted = unrestricted.or(Some(id));
            } else if coefficient < 0.0 {
                let ratio = -row.constant() / coefficient;
                if negative.is_none_or(|(_, current)| ratio < current) {
                    negative = Some((id, ratio));
                }
            } else {
                let ratio = row.constant() / coefficient;
                if positive.is_none_or(|(_, current)| ratio < current) {
                    positive = Some((id, ratio));
                }
            }
        }

        negative.or(positive).map(|(id, _)| id).or(unrestricted)
    }

    /// Exchange the basic variable of a row for `entering`, and eliminate `entering` from all
    /// other rows and the objectives.
    pub(super) fn pivot(&mut self, entering: VariableId, id: RowId) -> Result<()> {
        let mut row = self.take_row(id)?;
        let Some(leaving) = row.basic() else {
            self.restore_row(id, row);
            return Err(SolverError::InternalInconsistency(format!("row {} has no basic variable", id)));
        };
        if let Err(error) = row.pivot(entering, leaving) {
            self.restore_row(id, row);
            return Err(error);
        }
        trace!("pivot on {}: {} enters, {} leaves", id, entering, leaving);

        self.registry[leaving].set_definition(None);
        self.substitute(entering, &row);
        self.restore_row(id, row);

        Ok(())
    }

    /// Replace a variable by its new definition everywhere.
    ///
    /// Rows that end up infeasible are queued for the dual method.
    pub(super) fn substitute(&mut self, variable: VariableId, definition: &Row) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            let Some(row) = row else { continue };
            if row.substitute(variable, definition).is_none() {
                continue;
            }
            if is_infeasible(row, &self.registry) {
                self.infeasible_rows.push(RowId::new(index as u32));
            }
        }

        self.goal.substitute(variable, definition);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(variable, definition);
        }
    }

    /// Insert a row by minimizing a temporary variable standing in for its basic variable.
    ///
    /// # Errors
    ///
    /// `Unsatisfiable` if the temporary variable can't be driven to zero. Its row is dropped in
    /// that case, the remaining rows describe the same system as before the call.
    pub(super) fn add_with_artificial_variable(&mut self, mut row: Row) -> Result<()> {
        let artificial = self.registry.create("artificial", VariableKind::Unknown).id();
        row.assign_basic(Some(artificial));
        self.artificial = Some(Goal::from_row(&row, Strength::Equality));
        self.insert_row(row);

        let optimized = self.optimize(Objective::Artificial);
        let reached_zero = self.artificial.take().is_some_and(|goal| goal.value().is_zero());
        optimized?;

        if let Some(id) = self.registry[artificial].definition() {
            let mut row = self.remove_row(id)?;
            if !reached_zero {
                self.registry.release_id(artificial);
                return Err(SolverError::Unsatisfiable);
            }

            // Basic at zero, swap it for any other variable of its row
            if !row.is_constant() {
                let entering = zero_level_entering(&row, &self.registry)
                    .ok_or_else(|| SolverError::InternalInconsistency("empty artificial row".to_string()))?;
                row.pivot(entering, artificial)?;
                self.substitute(entering, &row);
                self.insert_row(row);
            }
        }

        for row in self.rows.iter_mut().flatten() {
            row.remove(artificial);
        }
        self.goal.remove(artificial);
        self.registry.release_id(artificial);

        Ok(())
    }

    fn has_restricted_basic(&self, row: &Row) -> bool {
        row.basic().is_some_and(|basic| self.registry[basic].kind().is_restricted())
    }
}

/// Whether the value a row gives its basic variable is out of that variable's range.
///
/// Restricted variables can't be negative, and pinned variables have to be exactly zero.
fn is_infeasible(row: &Row, registry: &VariableRegistry) -> bool {
    match row.basic().map(|basic| registry[basic].kind()) {
        Some(VariableKind::Constant) => row.constant() != 0.0,
        Some(kind) => kind.is_restricted() && row.constant() < 0.0,
        None => false,
    }
}

/// The variable to replace an artificial variable that is basic at zero.
///
/// Slack and error variables are preferred, any other variable is fine as well since the row's
/// value is zero.
fn zero_level_entering(row: &Row, registry: &VariableRegistry) -> Option<VariableId> {
    let terms = row.terms().to_vec();
    terms.iter()
        .find(|&&(variable, _)| registry[variable].kind().is_pivotable())
        .or_else(|| terms.first())
        .map(|&(variable, _)| variable)
}
