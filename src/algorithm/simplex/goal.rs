//! # Goal vector
//!
//! The objective the simplex method minimizes. Every coefficient is a strength vector rather than
//! a number, and the objective is minimized lexicographically: an improvement at a higher level
//! is worth any deterioration at a lower one.
//!
//! Like a row, the goal only mentions non-basic variables. When a variable becomes basic, its
//! definition is substituted, which is how the penalty on an error variable flows to the
//! variables it is expressed in.
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use itertools::Itertools;

use crate::data::linear_algebra::row::Row;
use crate::data::linear_algebra::storage::RowStorage;
use crate::data::variable::{Strength, StrengthVector, VariableId, VariableRegistry};

/// Objective `constant + Σ vector · variable`, minimized lexicographically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Goal {
    /// Objective value per level in the current basic solution.
    constant: StrengthVector,
    terms: BTreeMap<VariableId, StrengthVector>,
}

impl Goal {
    /// An objective that is zero at every level.
    pub fn new() -> Self {
        Self::default()
    }

    /// An objective minimizing the basic variable of a row, with all weight at one level.
    ///
    /// Used as the phase one objective when a row is inserted through an artificial variable.
    pub fn from_row(row: &Row, strength: Strength) -> Self {
        let mut goal = Self::new();
        goal.insert_row(row, &StrengthVector::unit(strength), 1.0);
        goal
    }

    /// Objective value per level.
    pub fn value(&self) -> &StrengthVector {
        &self.constant
    }

    /// Coefficient of a non-basic variable per level, if it appears.
    pub fn coefficient(&self, variable: VariableId) -> Option<&StrengthVector> {
        self.terms.get(&variable)
    }

    /// Number of variables with a non-zero coefficient.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no variable appears, so the objective is constant.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add `coefficient · vector` to the coefficient of a non-basic variable.
    pub fn insert_variable(&mut self, variable: VariableId, vector: &StrengthVector, coefficient: f64) {
        let entry = self.terms.entry(variable).or_default();
        entry.add_multiple(vector, coefficient);
        if entry.is_zero() {
            self.terms.remove(&variable);
        }
    }

    /// Add `coefficient · vector` times the right-hand side of a row.
    ///
    /// This is how a basic variable is added to the objective: through its definition.
    pub fn insert_row(&mut self, row: &Row, vector: &StrengthVector, coefficient: f64) {
        self.constant.add_multiple(vector, row.constant() * coefficient);
        row.terms().for_each(|variable, value| {
            self.insert_variable(variable, vector, value * coefficient);
        });
    }

    /// Replace a variable that became basic by its definition.
    pub fn substitute(&mut self, variable: VariableId, definition: &Row) {
        if let Some(vector) = self.terms.remove(&variable) {
            self.insert_row(definition, &vector, 1.0);
        }
    }

    /// Drop a variable from the objective, returning its coefficient.
    pub fn remove(&mut self, variable: VariableId) -> Option<StrengthVector> {
        self.terms.remove(&variable)
    }

    /// Pick the variable to enter the basis, if the objective can still improve.
    ///
    /// Only variables the simplex method may move qualify: slack, error and artificial ones.
    /// The candidate must be lexicographically negative, meaning that the highest level at which
    /// its vector is non-zero has a negative value. Among the candidates, the lexicographically
    /// smallest vector wins and ties go to the lowest identifier.
    ///
    /// # Return value
    ///
    /// `None` if the objective is optimal.
    pub fn select_pivot_column(&self, registry: &VariableRegistry) -> Option<VariableId> {
        let mut best: Option<(VariableId, &StrengthVector)> = None;
        for (&variable, vector) in &self.terms {
            if !registry[variable].kind().can_enter() || !vector.is_negative() {
                continue;
            }
            let improves = match best {
                None => true,
                Some((_, current)) => vector.lexicographic_cmp(current) == Ordering::Less,
            };
            if improves {
                best = Some((variable, vector));
            }
        }

        best.map(|(variable, _)| variable)
    }

    /// Pick the variable to enter the basis when repairing a row with a negative constant.
    ///
    /// Among the variables with a positive coefficient in the row, the one whose objective
    /// coefficient divided by its row coefficient is lexicographically smallest keeps the
    /// objective optimal. Ties go to the lowest identifier.
    ///
    /// # Return value
    ///
    /// `None` if no variable can enter, in which case the row can't be made feasible.
    pub fn dual_entering(&self, row: &Row, registry: &VariableRegistry) -> Option<VariableId> {
        let mut best: Option<(VariableId, StrengthVector)> = None;
        row.terms().for_each(|variable, coefficient| {
            if coefficient <= 0.0 || !registry[variable].kind().can_enter() {
                return;
            }
            let ratio = self.terms.get(&variable)
                .map_or_else(StrengthVector::default, |vector| vector.scaled(1.0 / coefficient));
            let improves = match best {
                None => true,
                Some((_, ref current)) => ratio.lexicographic_cmp(current) == Ordering::Less,
            };
            if improves {
                best = Some((variable, ratio));
            }
        });

        best.map(|(variable, _)| variable)
    }

    /// Render the objective with the variable names from the registry.
    pub fn describe(&self, registry: &VariableRegistry) -> String {
        let terms = self.terms.iter()
            .map(|(&variable, vector)| {
                let name = registry.get(variable)
                    .map(|record| record.name())
                    .filter(|name| !name.is_empty())
                    .map_or_else(|| variable.to_string(), str::to_string);
                format!("{} {}", vector, name)
            })
            .join(" + ");
        if terms.is_empty() {
            format!("minimize {}", self.constant)
        } else {
            format!("minimize {} + {}", self.constant, terms)
        }
    }
}

impl Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.constant)?;
        for (variable, vector) in &self.terms {
            write!(f, " + {} {}", vector, variable)?;
        }
        Ok(())
    }
}
