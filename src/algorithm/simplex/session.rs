//! # Layout-facing operations
//!
//! The calls a layout engine makes during one solve session: declare the variables of its
//! widgets, submit and withdraw relations between them, resolve and read back the values.
use std::iter;

use log::debug;

use crate::algorithm::simplex::{ConstraintHandle, LinearSystem, State};
use crate::algorithm::simplex::goal::Goal;
use crate::data::constraint::Constraint;
use crate::data::number_types::Amount;
use crate::data::variable::{DeclaredKind, Strength, Variable, VariableKind};
use crate::error::{Result, SolverError};

impl LinearSystem {
    /// Create a variable for the layout to constrain.
    ///
    /// # Arguments
    ///
    /// * `name`: Used in diagnostics only.
    /// * `kind`: Only unrestricted variables may take negative values.
    pub fn declare_variable(&mut self, name: impl Into<String>, kind: DeclaredKind) -> Variable {
        self.state = State::Building;
        self.registry.create(name, kind.into())
    }

    /// Submit `basic = constant + Σ coefficient · variable`.
    ///
    /// # Arguments
    ///
    /// * `strength`: `None` for a required relation.
    ///
    /// # Errors
    ///
    /// See `add_constraint`.
    pub fn submit(
        &mut self,
        basic: Variable,
        constant: f64,
        terms: &[(f64, Variable)],
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        let constraint = Constraint::definition(basic, constant, terms);
        self.add_constraint(&with_strength(constraint, strength))
    }

    /// Take back a relation submitted earlier.
    pub fn withdraw(&mut self, handle: ConstraintHandle) -> Result<()> {
        self.remove_constraint(handle)
    }

    /// Current value of a declared variable.
    ///
    /// Values are those of the current tableau, whether or not `resolve` was called since the
    /// last change.
    pub fn value_of(&self, variable: Variable) -> Result<f64> {
        let id = self.registry.resolve(variable)?;
        Ok(self.value(id))
    }

    /// Release a variable that no constraint mentions anymore.
    ///
    /// # Errors
    ///
    /// `VariableInUse` if the variable still appears in the tableau, and the usual handle errors.
    pub fn release_variable(&mut self, variable: Variable) -> Result<()> {
        let id = self.registry.resolve(variable)?;
        let tagged = self.constraints.values().any(|tag| tag.variables().any(|v| v == id));
        if tagged || self.is_referenced(id) {
            return Err(SolverError::VariableInUse(id));
        }

        self.registry.release_id(id);
        Ok(())
    }

    /// The error variables of a soft constraint, empty for a required one.
    pub fn error_variables(&self, handle: ConstraintHandle) -> Result<Vec<Variable>> {
        let tag = self.tag(handle)?;
        Ok(tag.variables()
            .filter(|&variable| self.registry[variable].kind() == VariableKind::Error)
            .filter_map(|variable| self.registry.handle(variable))
            .collect())
    }

    /// Strength a constraint was submitted with, `None` if it is required.
    pub fn constraint_strength(&self, handle: ConstraintHandle) -> Result<Option<Strength>> {
        self.tag(handle).map(|tag| tag.strength)
    }

    /// Drop all constraints and variables, and start a new session.
    ///
    /// Settings and counters survive. Every handle given out before is foreign afterwards.
    pub fn reset(&mut self) {
        debug!("reset after {} constraints in {} rows", self.constraints.len(), self.nr_rows());

        self.registry.reset();
        self.rows.clear();
        self.free_rows.clear();
        self.goal = Goal::new();
        self.artificial = None;
        self.constraints.clear();
        self.next_constraint = 0;
        self.infeasible_rows = iter::empty().collect();

        self.state = State::Empty;
        self.counters.resets += 1;
    }

    /// `a = b + margin`
    pub fn add_equality(
        &mut self,
        a: Variable,
        b: Variable,
        margin: f64,
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        self.add_constraint(&with_strength(Constraint::equal(a, b, margin), strength))
    }

    /// `a ≥ b + margin`
    pub fn add_greater_than(
        &mut self,
        a: Variable,
        b: Variable,
        margin: f64,
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        self.add_constraint(&with_strength(Constraint::greater_than(a, b, margin), strength))
    }

    /// `a ≤ b - margin`
    pub fn add_lower_than(
        &mut self,
        a: Variable,
        b: Variable,
        margin: f64,
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        self.add_constraint(&with_strength(Constraint::lower_than(a, b, margin), strength))
    }

    /// Place `[begin, end]` between two anchors, see `Constraint::centering`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_centering(
        &mut self,
        begin: Variable,
        start_anchor: Variable,
        start_margin: f64,
        bias: f64,
        end: Variable,
        end_anchor: Variable,
        end_margin: f64,
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        let constraint = Constraint::centering(
            begin, start_anchor, start_margin, bias, end, end_anchor, end_margin,
        );
        self.add_constraint(&with_strength(constraint, strength))
    }

    /// `a = ratio · b`
    pub fn add_ratio(
        &mut self,
        a: Variable,
        b: Variable,
        ratio: Amount,
        strength: Option<Strength>,
    ) -> Result<ConstraintHandle> {
        self.add_constraint(&with_strength(Constraint::ratio(a, b, ratio), strength))
    }
}

fn with_strength(constraint: Constraint, strength: Option<Strength>) -> Constraint {
    match strength {
        Some(strength) => constraint.with_strength(strength),
        None => constraint,
    }
}
