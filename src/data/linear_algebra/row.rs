//! # Tableau rows
//!
//! A row expresses its basic variable in terms of the non-basic ones:
//!
//! `basic = constant + Σ coefficient · variable`
//!
//! While a constraint is being inserted the row has no basic variable yet, and reads as
//! `0 = constant + Σ coefficient · variable`.
use std::fmt::{self, Display};

use itertools::Itertools;

use crate::data::linear_algebra::storage::{RowStorage, Storage};
use crate::data::variable::{VariableId, VariableRegistry};
use crate::error::{Result, SolverError};

/// Index of a row in the system's row arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RowId(u32);

impl RowId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the row in the tableau.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A linear expression, possibly defining a basic variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    basic: Option<VariableId>,
    constant: f64,
    terms: Storage,
}

impl Row {
    /// Create a row `0 = constant`.
    pub fn new(constant: f64, terms: Storage) -> Self {
        debug_assert!(terms.is_empty());

        Self { basic: None, constant, terms }
    }

    /// The variable this row defines, if any.
    pub fn basic(&self) -> Option<VariableId> {
        self.basic
    }

    pub(crate) fn assign_basic(&mut self, basic: Option<VariableId>) {
        debug_assert!(basic.is_none_or(|basic| !self.terms.contains(basic)));

        self.basic = basic;
    }

    /// Constant term, the value of the basic variable when all others are zero.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Coefficient of a non-basic variable, zero if it doesn't appear.
    pub fn coefficient(&self, variable: VariableId) -> f64 {
        self.terms.get(variable)
    }

    /// Coefficients of the non-basic variables.
    pub fn terms(&self) -> &Storage {
        &self.terms
    }

    /// Number of non-basic variables in the row.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the right-hand side is only a constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Add a multiple of a variable to the right-hand side.
    ///
    /// If the coefficient cancels an existing term, the term disappears.
    pub fn insert(&mut self, variable: VariableId, coefficient: f64) {
        debug_assert_ne!(Some(variable), self.basic);

        self.terms.add(variable, coefficient);
    }

    /// Remove a variable from the right-hand side.
    ///
    /// # Return value
    ///
    /// Its coefficient, if it appeared.
    pub fn remove(&mut self, variable: VariableId) -> Option<f64> {
        self.terms.remove(variable)
    }

    /// Fold a multiple of another row's right-hand side into this one.
    ///
    /// # Arguments
    ///
    /// * `other`: Row whose constant and terms get added. Its basic variable is ignored.
    /// * `coefficient`: Multiplier for `other`.
    pub fn add_row(&mut self, other: &Row, coefficient: f64) {
        self.constant += other.constant * coefficient;
        let terms = &mut self.terms;
        other.terms.for_each(|variable, value| {
            terms.add(variable, value * coefficient);
        });
    }

    /// Multiply both sides by `-1`.
    ///
    /// Only meaningful for rows that don't have a basic variable yet.
    pub fn reverse_sign(&mut self) {
        debug_assert!(self.basic.is_none());

        self.constant = -self.constant;
        self.terms.negate();
    }

    /// Make `entering` the basic variable of this row.
    ///
    /// The current basic variable (if any) moves to the right-hand side with coefficient `-1`,
    /// after which the row is divided by minus the coefficient `entering` had.
    ///
    /// # Errors
    ///
    /// `ZeroPivot` if `entering` doesn't appear in the row. The row is unchanged in that case.
    pub fn solve_for(&mut self, entering: VariableId) -> Result<()> {
        let coefficient = match self.terms.remove(entering) {
            Some(coefficient) => coefficient,
            None => return Err(SolverError::ZeroPivot { variable: entering }),
        };

        if let Some(leaving) = self.basic {
            self.terms.put(leaving, -1.0);
        }
        let divisor = -coefficient;
        self.constant /= divisor;
        if self.constant == 0.0 {
            // No negative zero
            self.constant = 0.0;
        }
        self.terms.divide_by(divisor);
        self.basic = Some(entering);

        Ok(())
    }

    /// Exchange the basic variable `leaving` for `entering`.
    ///
    /// # Errors
    ///
    /// If `leaving` isn't the basic variable of this row, or `entering` doesn't appear in it.
    pub fn pivot(&mut self, entering: VariableId, leaving: VariableId) -> Result<()> {
        if self.basic != Some(leaving) {
            return Err(SolverError::InternalInconsistency(format!(
                "{} is not basic in the row it should leave", leaving,
            )));
        }

        self.solve_for(entering)
    }

    /// Replace a variable by the right-hand side of the row defining it.
    ///
    /// # Return value
    ///
    /// The coefficient the variable had in this row, if it appeared at all.
    pub fn substitute(&mut self, variable: VariableId, definition: &Row) -> Option<f64> {
        let coefficient = self.terms.remove(variable)?;
        self.add_row(definition, coefficient);
        Some(coefficient)
    }

    /// Render the row with the variable names from the registry.
    pub fn describe(&self, registry: &VariableRegistry) -> String {
        let name = |variable: VariableId| match registry.get(variable) {
            Some(record) if !record.name().is_empty() => record.name().to_string(),
            _ => variable.to_string(),
        };

        let left = self.basic.map_or_else(|| "0".to_string(), name);
        let terms = self.terms.to_vec();
        if terms.is_empty() {
            format!("{} = {}", left, self.constant)
        } else {
            let right = terms.iter()
                .map(|&(variable, coefficient)| format!("{} {}", coefficient, name(variable)))
                .join(" + ");
            format!("{} = {} + {}", left, self.constant, right)
        }
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.basic {
            Some(basic) => write!(f, "{} = ", basic)?,
            None => f.write_str("0 = ")?,
        }
        write!(f, "{}", self.constant)?;

        let mut result = Ok(());
        self.terms.for_each(|variable, coefficient| {
            if result.is_ok() {
                result = write!(f, " + {} {}", coefficient, variable);
            }
        });
        result
    }
}

#[cfg(test)]
mod test {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use crate::data::linear_algebra::row::Row;
    use crate::data::linear_algebra::storage::{RowStorage, Storage};
    use crate::data::variable::{VariableId, VariableKind, VariableRegistry};
    use crate::error::SolverError;

    fn v(index: u32) -> VariableId {
        VariableId::new(index)
    }

    /// Build `basic = constant + Σ terms`.
    fn row(basic: u32, constant: f64, terms: &[(u32, f64)], dense: bool) -> Row {
        let storage = if dense { Storage::dense(4, 16) } else { Storage::hashed(4) };
        let mut row = Row::new(constant, storage);
        for &(index, coefficient) in terms {
            row.insert(v(index), coefficient);
        }
        row.assign_basic(Some(v(basic)));
        row
    }

    #[test]
    fn solve_for() {
        for dense in [true, false] {
            // x = 3 + 2 y - z
            let mut r = row(0, 3.0, &[(1, 2.0), (2, -1.0)], dense);
            r.solve_for(v(1)).unwrap();
            // y = -1.5 + 0.5 x + 0.5 z
            assert_eq!(r.basic(), Some(v(1)));
            assert_eq!(r.constant(), -1.5);
            assert_eq!(r.terms().to_vec(), vec![(v(0), 0.5), (v(2), 0.5)]);

            r.solve_for(v(0)).unwrap();
            assert_eq!(r, row(0, 3.0, &[(1, 2.0), (2, -1.0)], dense));
        }
    }

    #[test]
    fn solve_for_without_basic() {
        // 0 = 10 - a + b
        let mut r = Row::new(10.0, Storage::dense(2, 16));
        r.insert(v(0), -1.0);
        r.insert(v(1), 1.0);
        r.solve_for(v(0)).unwrap();
        assert_eq!(r.to_string(), "v0 = 10 + 1 v1");
    }

    #[test]
    fn zero_constant_has_no_sign() {
        // 0 = 0 + 2 x - 2 y, solved for x divides zero by -2
        let mut r = Row::new(0.0, Storage::dense(2, 16));
        r.insert(v(0), 2.0);
        r.insert(v(1), -2.0);
        r.solve_for(v(0)).unwrap();

        assert!(r.constant().is_sign_positive());
        assert_eq!(r.to_string(), "v0 = 0 + 1 v1");
    }

    #[test]
    fn zero_pivot() {
        let mut r = row(0, 1.0, &[(1, 1.0)], true);
        let before = r.clone();
        assert_eq!(r.solve_for(v(5)), Err(SolverError::ZeroPivot { variable: v(5) }));
        assert_eq!(r, before);
    }

    #[test]
    fn pivot_checks_leaving() {
        let mut r = row(0, 1.0, &[(1, 1.0)], true);
        assert!(matches!(r.pivot(v(1), v(3)), Err(SolverError::InternalInconsistency(_))));
        r.pivot(v(1), v(0)).unwrap();
        assert_eq!(r.basic(), Some(v(1)));
    }

    #[test]
    fn substitute() {
        // a = 1 + 2 x + y, x = 4 - y + z
        let mut a = row(0, 1.0, &[(1, 2.0), (2, 1.0)], true);
        let x = row(1, 4.0, &[(2, -1.0), (3, 1.0)], false);
        assert_eq!(a.substitute(v(1), &x), Some(2.0));
        // a = 9 - y + 2 z
        assert_eq!(a.constant(), 9.0);
        assert_eq!(a.terms().to_vec(), vec![(v(2), -1.0), (v(3), 2.0)]);
        assert_eq!(a.substitute(v(1), &x), None);
    }

    #[test]
    fn cancellation_removes_terms() {
        let mut a = row(0, 0.0, &[(1, 1.0), (2, 1.0)], false);
        let b = row(3, 2.0, &[(1, 1.0)], true);
        a.add_row(&b, -1.0);
        assert_eq!(a.constant(), -2.0);
        assert!(!a.terms().contains(v(1)));
        assert_eq!(a.len(), 1);
        a.remove(v(2));
        assert!(a.is_constant());
    }

    #[test]
    fn reverse_sign() {
        let mut r = Row::new(-3.0, Storage::hashed(2));
        r.insert(v(4), 2.0);
        r.reverse_sign();
        assert_eq!(r.constant(), 3.0);
        assert_eq!(r.coefficient(v(4)), -2.0);
    }

    #[test]
    fn describe() {
        let mut registry = VariableRegistry::new();
        let width = registry.create("width", VariableKind::Unrestricted);
        let slack = registry.create("", VariableKind::Slack);
        let mut r = Row::new(5.0, Storage::dense(2, 16));
        r.insert(slack.id(), -1.0);
        r.assign_basic(Some(width.id()));
        assert_eq!(r.describe(&registry), format!("width = 5 + -1 {}", slack.id()));
    }

    proptest! {
        #[test]
        fn pivot_round_trip(
            constant in -100i32..100,
            coefficients in prop::collection::vec(prop_oneof![-9i32..=-1, 1i32..=9], 1..12),
            dense in any::<bool>(),
        ) {
            let basic = coefficients.len() as u32;
            let terms = coefficients.iter()
                .enumerate()
                .map(|(i, &c)| (i as u32, c as f64))
                .collect::<Vec<_>>();
            let original = row(basic, constant as f64, &terms, dense);

            let mut r = original.clone();
            r.pivot(v(0), v(basic)).unwrap();
            r.pivot(v(basic), v(0)).unwrap();

            prop_assert_eq!(r.basic(), original.basic());
            prop_assert!(approx_eq!(f64, r.constant(), original.constant(), epsilon = 1e-9));
            let round_tripped = r.terms().to_vec();
            let expected = original.terms().to_vec();
            prop_assert_eq!(round_tripped.len(), expected.len());
            for ((variable, value), (expected_variable, expected_value)) in round_tripped.into_iter().zip(expected) {
                prop_assert_eq!(variable, expected_variable);
                prop_assert!(approx_eq!(f64, value, expected_value, epsilon = 1e-9));
            }
        }
    }
}
