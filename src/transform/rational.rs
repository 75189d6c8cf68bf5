//! Exact rational numbers for transform cost models.

use std::cmp::Ordering;
use std::fmt;

/// A non-negative rational number kept in lowest terms.
///
/// Used as the worst-case output/input byte ratio of a transform. It is
/// never converted to floating point; [`Rational::ceil_mul`] computes the
/// exact ceiling needed by buffer sizing.
///
/// # Example
///
/// ```
/// use chunkform::Rational;
///
/// let base64 = Rational::new(8, 6);
/// assert_eq!(base64, Rational::new(4, 3));
/// assert_eq!(base64.ceil_mul(12), Some(16));
/// assert_eq!(base64.ceil_mul(10), Some(14));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: u64,
    denominator: u64,
}

impl Rational {
    /// One to one.
    pub const ONE: Rational = Rational::new(1, 1);

    /// Zero.
    pub const ZERO: Rational = Rational::new(0, 1);

    /// Creates a rational number in lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        assert!(denominator != 0, "rational denominator must be non-zero");
        let divisor = gcd(numerator, denominator);
        Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        }
    }

    /// Returns the numerator.
    pub const fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Returns the denominator.
    pub const fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Returns the reciprocal, or `None` for zero.
    pub const fn reciprocal(&self) -> Option<Self> {
        if self.numerator == 0 {
            None
        } else {
            Some(Self::new(self.denominator, self.numerator))
        }
    }

    /// Computes `ceil(n * self)` exactly.
    ///
    /// Returns `None` if the result does not fit in `usize`.
    pub fn ceil_mul(&self, n: usize) -> Option<usize> {
        let product = (n as u128) * (self.numerator as u128);
        let denominator = self.denominator as u128;
        let quotient = product.div_ceil(denominator);
        usize::try_from(quotient).ok()
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ONE
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = (self.numerator as u128) * (other.denominator as u128);
        let right = (other.numerator as u128) * (self.denominator as u128);
        left.cmp(&right)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    // gcd(0, d) == d, and d is non-zero here
    a
}
