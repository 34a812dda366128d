// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, Div},
};
use yard_core::cost::Relocations;

/// Expected relocations, kept exact. A state from which no completion
/// exists is worth `Infinite`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expectation {
    Finite(BigRational),
    Infinite,
}

impl Expectation {
    #[inline]
    pub fn zero() -> Self {
        Expectation::Finite(BigRational::zero())
    }

    #[inline]
    pub fn from_integer(value: u64) -> Self {
        Expectation::Finite(BigRational::from_integer(BigInt::from(value)))
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        matches!(self, Expectation::Finite(_))
    }

    #[inline]
    pub fn finite(&self) -> Option<&BigRational> {
        match self {
            Expectation::Finite(v) => Some(v),
            Expectation::Infinite => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Expectation::Finite(v) => v.to_f64().unwrap_or(f64::INFINITY),
            Expectation::Infinite => f64::INFINITY,
        }
    }

    /// Average of equally likely expectations; one infinite term makes the
    /// whole average infinite. An empty input averages to zero.
    pub fn mean<I: IntoIterator<Item = Expectation>>(values: I) -> Self {
        let mut sum = Expectation::zero();
        let mut count = 0u64;
        for v in values {
            sum = sum + v;
            count += 1;
        }
        if count == 0 { Expectation::zero() } else { sum / count }
    }
}

impl From<Relocations> for Expectation {
    #[inline]
    fn from(value: Relocations) -> Self {
        Expectation::from_integer(value.value())
    }
}

impl Add for Expectation {
    type Output = Expectation;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Expectation::Finite(a), Expectation::Finite(b)) => Expectation::Finite(a + b),
            _ => Expectation::Infinite,
        }
    }
}

impl Add<Relocations> for Expectation {
    type Output = Expectation;

    #[inline]
    fn add(self, rhs: Relocations) -> Self::Output {
        self + Expectation::from(rhs)
    }
}

impl Div<u64> for Expectation {
    type Output = Expectation;

    fn div(self, rhs: u64) -> Self::Output {
        match self {
            Expectation::Finite(v) => {
                Expectation::Finite(v / BigRational::from_integer(BigInt::from(rhs)))
            }
            Expectation::Infinite => Expectation::Infinite,
        }
    }
}

impl PartialOrd for Expectation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expectation {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Expectation::Finite(a), Expectation::Finite(b)) => a.cmp(b),
            (Expectation::Finite(_), Expectation::Infinite) => Ordering::Less,
            (Expectation::Infinite, Expectation::Finite(_)) => Ordering::Greater,
            (Expectation::Infinite, Expectation::Infinite) => Ordering::Equal,
        }
    }
}

impl Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Finite(v) => write!(f, "{}", v),
            Expectation::Infinite => write!(f, "inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(n: i64, d: i64) -> Expectation {
        Expectation::Finite(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    #[test]
    fn test_mean_is_exact() {
        let m = Expectation::mean([1u64, 0, 0].map(Expectation::from_integer));
        assert_eq!(m, ratio(1, 3));
        assert_eq!(format!("{}", m), "1/3");
        assert_eq!(Expectation::mean(Vec::new()), Expectation::zero());
    }

    #[test]
    fn test_infinity_absorbs() {
        let m = Expectation::mean([Expectation::zero(), Expectation::Infinite]);
        assert_eq!(m, Expectation::Infinite);
        assert_eq!(Expectation::Infinite + Relocations::ONE, Expectation::Infinite);
        assert_eq!(m.to_f64(), f64::INFINITY);
    }

    #[test]
    fn test_ordering_puts_infinity_last() {
        assert!(ratio(7, 2) < Expectation::Infinite);
        assert!(ratio(1, 3) < ratio(1, 2));
        assert_eq!(
            [Expectation::Infinite, ratio(1, 2)].into_iter().min(),
            Some(ratio(1, 2))
        );
    }
}
