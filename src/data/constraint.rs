//! # Constraints
//!
//! Layout code states relations between variables as `expression relation 0`, where the
//! expression is affine in the variables. The helpers below build the shapes that relative layout
//! needs most: equality with a margin, one-sided bounds, biased centering and exact ratios.
use std::fmt::{self, Display};

use itertools::Itertools;

use crate::data::number_types::Amount;
use crate::data::variable::{Strength, Variable};

/// How the expression of a constraint relates to zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Relation {
    /// `expression = 0`
    Equal,
    /// `expression ≤ 0`
    LessOrEqual,
    /// `expression ≥ 0`
    GreaterOrEqual,
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Relation::Equal => "=",
            Relation::LessOrEqual => "<=",
            Relation::GreaterOrEqual => ">=",
        })
    }
}

/// An affine expression `constant + Σ coefficient · variable`.
///
/// A variable may appear more than once, the terms are combined when the expression is lowered
/// into a row.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Expression {
    constant: f64,
    terms: Vec<(f64, Variable)>,
}

impl Expression {
    /// A constant expression.
    pub fn new(constant: f64) -> Self {
        Self { constant, terms: Vec::new() }
    }

    /// Create from a constant and terms.
    pub fn from_terms(constant: f64, terms: &[(f64, Variable)]) -> Self {
        Self { constant, terms: terms.to_vec() }
    }

    /// Add a term.
    #[must_use]
    pub fn plus(mut self, coefficient: f64, variable: Variable) -> Self {
        self.terms.push((coefficient, variable));
        self
    }

    /// Add a constant.
    #[must_use]
    pub fn plus_constant(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    /// The constant part.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// The terms in the order they were added, duplicates included.
    pub fn terms(&self) -> &[(f64, Variable)] {
        &self.terms
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::new(0.0).plus(1.0, variable)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.constant)?;
        if !self.terms.is_empty() {
            write!(f, " + {}", self.terms.iter().map(|(c, v)| format!("{} {}", c, v)).join(" + "))?;
        }
        Ok(())
    }
}

/// A linear relation, optionally soft.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    expression: Expression,
    relation: Relation,
    /// `None` for required constraints.
    strength: Option<Strength>,
}

impl Constraint {
    /// A required constraint `expression relation 0`.
    pub fn new(expression: Expression, relation: Relation) -> Self {
        Self { expression, relation, strength: None }
    }

    /// Make the constraint soft: the solver may violate it, and minimizes the violation at the
    /// given level.
    #[must_use]
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = Some(strength);
        self
    }

    /// `basic = constant + Σ coefficient · variable`
    pub fn definition(basic: Variable, constant: f64, terms: &[(f64, Variable)]) -> Self {
        let expression = Expression::from_terms(constant, terms).plus(-1.0, basic);
        Self::new(expression, Relation::Equal)
    }

    /// `a = b + margin`
    pub fn equal(a: Variable, b: Variable, margin: f64) -> Self {
        let expression = Expression::new(-margin).plus(1.0, a).plus(-1.0, b);
        Self::new(expression, Relation::Equal)
    }

    /// `a ≥ b + margin`
    pub fn greater_than(a: Variable, b: Variable, margin: f64) -> Self {
        let expression = Expression::new(-margin).plus(1.0, a).plus(-1.0, b);
        Self::new(expression, Relation::GreaterOrEqual)
    }

    /// `a ≤ b - margin`
    pub fn lower_than(a: Variable, b: Variable, margin: f64) -> Self {
        let expression = Expression::new(margin).plus(1.0, a).plus(-1.0, b);
        Self::new(expression, Relation::LessOrEqual)
    }

    /// Place the span `[begin, end]` between two anchors.
    ///
    /// The free space on either side of the span is divided according to the bias:
    /// `(1 - bias) · (begin - start_anchor - start_margin) = bias · (end_anchor - end - end_margin)`.
    /// A bias of one half centers the span, zero pushes it against the start anchor and one
    /// against the end anchor.
    ///
    /// # Arguments
    ///
    /// * `bias`: Clamped to `[0, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn centering(
        begin: Variable,
        start_anchor: Variable,
        start_margin: f64,
        bias: f64,
        end: Variable,
        end_anchor: Variable,
        end_margin: f64,
    ) -> Self {
        let bias = bias.clamp(0.0, 1.0);
        let expression = Expression::new(-(1.0 - bias) * start_margin + bias * end_margin)
            .plus(1.0 - bias, begin)
            .plus(-(1.0 - bias), start_anchor)
            .plus(-bias, end_anchor)
            .plus(bias, end);
        Self::new(expression, Relation::Equal)
    }

    /// `a = ratio · b`, with the ratio given exactly.
    ///
    /// Lowered as `denominator · a - numerator · b = 0`, so no rounding happens for ratios of
    /// moderately sized integers.
    pub fn ratio(a: Variable, b: Variable, ratio: Amount) -> Self {
        let expression = Expression::new(0.0)
            .plus(ratio.denominator() as f64, a)
            .plus(-(ratio.numerator() as f64), b);
        Self::new(expression, Relation::Equal)
    }

    /// Left-hand side, compared against zero.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// How the expression relates to zero.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Strength of a soft constraint, `None` if it is required.
    pub fn strength(&self) -> Option<Strength> {
        self.strength
    }

    /// Whether the constraint has to hold exactly.
    pub fn is_required(&self) -> bool {
        self.strength.is_none()
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} 0", self.expression, self.relation)?;
        if let Some(strength) = self.strength {
            write!(f, " ({:?})", strength)?;
        }
        Ok(())
    }
}
