//! # Exact fractions
//!
//! Ratios between dimensions ("width is 3/10 of the height") are kept exact until they are lowered
//! into floating point rows. The `Amount` type is small on purpose: a pair of machine integers in
//! lowest terms, with the sign living on the numerator.
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

/// An exact fraction `numerator / denominator`.
///
/// Always in lowest terms with `denominator > 0`. Arithmetic panics when a reduced result doesn't
/// fit in an `i64`, as integer arithmetic does on overflow.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Amount {
    numerator: i64,
    denominator: i64,
}

impl Amount {
    /// Create a new fraction.
    ///
    /// # Arguments
    ///
    /// * `numerator`: Any value.
    /// * `denominator`: Non-zero value, may be negative.
    ///
    /// # Return value
    ///
    /// The fraction in lowest terms with a positive denominator.
    ///
    /// # Panics
    ///
    /// If `denominator` is zero, or if the reduced fraction doesn't fit in an `i64`. The latter
    /// only happens for `i64::MIN` over a negative denominator, such as `Amount::new(i64::MIN, -1)`.
    #[must_use]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert_ne!(denominator, 0, "denominator of an amount can't be zero");

        Self::reduced(i128::from(numerator), i128::from(denominator))
    }

    /// A whole number.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self { numerator: value, denominator: 1 }
    }

    /// Carries the sign of the fraction.
    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    /// Always positive.
    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// The multiplicative inverse.
    ///
    /// Panics when called on zero, like division by zero would.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self::new(self.denominator, self.numerator)
    }

    /// Lower to a float for use in a tableau row.
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Whether the fraction is below zero.
    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Bring a fraction computed in wide integers back to lowest terms.
    ///
    /// Intermediate products of two `i64` fractions always fit in an `i128`, the reduced result
    /// must fit in an `i64` again.
    fn reduced(numerator: i128, denominator: i128) -> Self {
        debug_assert_ne!(denominator, 0);

        let (mut numerator, mut denominator) = if denominator < 0 {
            (-numerator, -denominator)
        } else {
            (numerator, denominator)
        };

        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs());
        if divisor > 1 {
            // Both are divisible and the divisor is at most the denominator, which fits.
            let divisor = divisor as i128;
            numerator /= divisor;
            denominator /= divisor;
        }
        if numerator == 0 {
            denominator = 1;
        }

        match (i64::try_from(numerator), i64::try_from(denominator)) {
            (Ok(numerator), Ok(denominator)) => Self { numerator, denominator },
            _ => panic!("amount {}/{} overflows 64 bits", numerator, denominator),
        }
    }
}

/// Greatest common divisor, Euclid's algorithm.
fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }

    a
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl Zero for Amount {
    fn zero() -> Self {
        Self { numerator: 0, denominator: 1 }
    }

    fn is_zero(&self) -> bool {
        self.numerator == 0
    }
}

impl One for Amount {
    fn one() -> Self {
        Self { numerator: 1, denominator: 1 }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let (a, b) = (i128::from(self.numerator), i128::from(self.denominator));
        let (c, d) = (i128::from(rhs.numerator), i128::from(rhs.denominator));

        Self::reduced(a * d + c * b, b * d)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + -rhs
    }
}

impl Mul for Amount {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::reduced(
            i128::from(self.numerator) * i128::from(rhs.numerator),
            i128::from(self.denominator) * i128::from(rhs.denominator),
        )
    }
}

impl Div for Amount {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        assert_ne!(rhs.numerator, 0, "division of an amount by zero");

        Self::reduced(
            i128::from(self.numerator) * i128::from(rhs.denominator),
            i128::from(self.denominator) * i128::from(rhs.numerator),
        )
    }
}

/// Panics when negating a fraction with numerator `i64::MIN`.
impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::reduced(-i128::from(self.numerator), i128::from(self.denominator))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Amount {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Amount {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross multiplication keeps the order.
        let left = i128::from(self.numerator) * i128::from(other.denominator);
        let right = i128::from(other.numerator) * i128::from(self.denominator);
        left.cmp(&right)
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}
