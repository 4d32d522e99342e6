//! # Strengths
//!
//! Soft constraints are ranked by a discrete strength. When the system is over-constrained, a
//! violation at a higher level is never traded for any amount of violation at a lower level. This
//! is achieved by giving each objective coefficient one component per level and comparing those
//! vectors lexicographically, highest level first.
use std::cmp::Ordering;
use std::fmt::{self, Display};

use enum_map::{Enum, EnumMap};
use itertools::Itertools;

use crate::error::{Result, SolverError};

/// Priority level of a soft constraint, from lowest to highest.
#[allow(missing_docs)]
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Strength {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
    Equality,
}

impl Strength {
    /// Number of levels in a strength vector.
    pub const NR_LEVELS: usize = 6;
    /// All levels, ordered from lowest to highest.
    pub const ALL: [Strength; Strength::NR_LEVELS] = [
        Strength::Lowest,
        Strength::Low,
        Strength::Medium,
        Strength::High,
        Strength::Highest,
        Strength::Equality,
    ];

    /// Index of this level, `0` being the lowest.
    pub fn level(self) -> usize {
        match self {
            Strength::Lowest => 0,
            Strength::Low => 1,
            Strength::Medium => 2,
            Strength::High => 3,
            Strength::Highest => 4,
            Strength::Equality => 5,
        }
    }

    /// The strength at a level index.
    ///
    /// # Errors
    ///
    /// If `level` is not below `NR_LEVELS`.
    pub fn from_level(level: usize) -> Result<Self> {
        Self::ALL.get(level).copied().ok_or(SolverError::InvalidStrength(level))
    }
}

/// A value for each strength level.
///
/// Used both as the penalty an error variable puts on the objective (a single `1` at its level)
/// and as the objective coefficient of a variable after substitutions have mixed levels.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct StrengthVector(EnumMap<Strength, f64>);

impl StrengthVector {
    /// A vector with a one at `strength` and zeros elsewhere.
    #[must_use]
    pub fn unit(strength: Strength) -> Self {
        let mut vector = Self::default();
        vector.0[strength] = 1.0;
        vector
    }

    /// Component at one level.
    pub fn get(&self, strength: Strength) -> f64 {
        self.0[strength]
    }

    /// Add a multiple of another vector to this one, component wise.
    pub fn add_multiple(&mut self, other: &StrengthVector, factor: f64) {
        for (strength, value) in self.0.iter_mut() {
            *value += other.0[strength] * factor;
        }
    }

    /// A copy of this vector with every component multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut result = *self;
        for value in result.0.values_mut() {
            *value *= factor;
        }
        result
    }

    /// Whether every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.values().all(|&value| value == 0.0)
    }

    /// Whether the vector is lexicographically negative.
    ///
    /// Levels are visited from highest to lowest and the first non-zero component decides. A
    /// positive value at a higher level hence overrules any negative value at a lower level.
    pub fn is_negative(&self) -> bool {
        self.sign() == Ordering::Less
    }

    /// Lexicographic sign, highest level first.
    pub fn sign(&self) -> Ordering {
        Strength::ALL.iter().rev()
            .map(|&strength| self.0[strength])
            .find(|&value| value != 0.0)
            .map_or(Ordering::Equal, |value| if value < 0.0 { Ordering::Less } else { Ordering::Greater })
    }

    /// Compare two vectors lexicographically, highest level first.
    pub fn lexicographic_cmp(&self, other: &StrengthVector) -> Ordering {
        Strength::ALL.iter().rev()
            .map(|&strength| {
                self.0[strength].partial_cmp(&other.0[strength]).unwrap_or(Ordering::Equal)
            })
            .find(|&ordering| ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Highest level with a non-zero component.
    pub fn highest_level(&self) -> Option<Strength> {
        Strength::ALL.iter().rev().copied().find(|&strength| self.0[strength] != 0.0)
    }
}

impl Display for StrengthVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.0.values().join(", "))
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use crate::data::variable::strength::{Strength, StrengthVector};
    use crate::error::SolverError;

    fn vector(values: [f64; Strength::NR_LEVELS]) -> StrengthVector {
        let mut result = StrengthVector::default();
        for (strength, value) in Strength::ALL.iter().zip(values) {
            result.add_multiple(&StrengthVector::unit(*strength), value);
        }
        result
    }

    #[test]
    fn levels() {
        for (index, strength) in Strength::ALL.iter().enumerate() {
            assert_eq!(strength.level(), index);
            assert_eq!(Strength::from_level(index), Ok(*strength));
        }
        assert_eq!(Strength::from_level(6), Err(SolverError::InvalidStrength(6)));
        assert!(Strength::Low < Strength::Equality);
    }

    #[test]
    fn unit() {
        let unit = StrengthVector::unit(Strength::Medium);
        assert_eq!(unit.get(Strength::Medium), 1.0);
        assert_eq!(unit.highest_level(), Some(Strength::Medium));
        assert_eq!(StrengthVector::default().highest_level(), None);
        assert!(StrengthVector::default().is_zero());
    }

    #[test]
    fn higher_level_decides_sign() {
        assert!(vector([0.0, 0.0, -1.0, 0.0, 0.0, 0.0]).is_negative());
        // A positive value at a higher level resets a lower negative value.
        assert!(!vector([0.0, 0.0, -5.0, 0.0, 0.0, 1.0]).is_negative());
        assert!(vector([3.0, 0.0, 0.0, 0.0, -1.0, 0.0]).is_negative());
        assert_eq!(StrengthVector::default().sign(), Ordering::Equal);
    }

    #[test]
    fn lexicographic_order() {
        let high = vector([0.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        let low = vector([-100.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(high.lexicographic_cmp(&low), Ordering::Less);
        assert_eq!(low.lexicographic_cmp(&high), Ordering::Greater);

        let a = vector([0.0, -1.0, 0.0, 0.0, 0.0, -1.0]);
        let b = vector([0.0, -2.0, 0.0, 0.0, 0.0, -1.0]);
        assert_eq!(b.lexicographic_cmp(&a), Ordering::Less);
        assert_eq!(a.lexicographic_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn arithmetic() {
        let mut a = StrengthVector::unit(Strength::Low);
        a.add_multiple(&StrengthVector::unit(Strength::High), -2.0);
        assert_eq!(a.get(Strength::High), -2.0);
        assert_eq!(a.scaled(0.5).get(Strength::Low), 0.5);
        assert_eq!(a.to_string(), "[0, 1, 0, -2, 0, 0]");
    }
}
