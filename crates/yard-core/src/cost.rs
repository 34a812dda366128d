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

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign},
};

use num_traits::{CheckedAdd, SaturatingAdd, Zero};

/// Number of relocations (reshuffles) caused by handling containers.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Relocations(u64);

impl Relocations {
    pub const ONE: Relocations = Relocations(1);

    #[inline]
    pub const fn new(value: u64) -> Self {
        Relocations(value)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    #[inline]
    pub fn checked_add(self, other: Relocations) -> Option<Self> {
        self.0.checked_add(other.0).map(Relocations)
    }

    #[inline]
    pub fn saturating_add(self, other: Relocations) -> Self {
        Relocations(self.0.saturating_add(other.0))
    }

    #[inline]
    pub const fn increment(self) -> Self {
        Relocations(self.0.saturating_add(1))
    }
}

impl Display for Relocations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Relocations({})", self.0)
    }
}

impl From<u64> for Relocations {
    #[inline]
    fn from(value: u64) -> Self {
        Relocations(value)
    }
}

impl From<usize> for Relocations {
    #[inline]
    fn from(value: usize) -> Self {
        Relocations(value as u64)
    }
}

impl Add for Relocations {
    type Output = Relocations;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Relocations(
            self.0
                .checked_add(rhs.0)
                .expect("overflow in Relocations + Relocations"),
        )
    }
}

impl AddAssign for Relocations {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl CheckedAdd for Relocations {
    #[inline]
    fn checked_add(&self, rhs: &Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Relocations)
    }
}

impl SaturatingAdd for Relocations {
    #[inline]
    fn saturating_add(&self, rhs: &Self) -> Self {
        Relocations(self.0.saturating_add(rhs.0))
    }
}

impl Zero for Relocations {
    fn zero() -> Self {
        Relocations(0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Sum for Relocations {
    #[inline]
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Relocations::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Relocations> for Relocations {
    #[inline]
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Relocations::zero(), |a, b| a + *b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocations_creation_and_display() {
        let r = Relocations::new(3);
        assert_eq!(r.value(), 3);
        assert_eq!(format!("{}", r), "Relocations(3)");
    }

    #[test]
    fn test_relocations_sum() {
        let parts = [Relocations::new(1), Relocations::new(0), Relocations::new(4)];
        let total: Relocations = parts.iter().sum();
        assert_eq!(total, Relocations::new(5));
        assert_eq!(parts.into_iter().sum::<Relocations>().value(), 5);
    }

    #[test]
    fn test_relocations_increment_and_assign() {
        let mut r = Relocations::zero();
        r += Relocations::ONE;
        r = r.increment();
        assert_eq!(r.value(), 2);
        assert!(!r.is_zero());
    }

    #[test]
    #[should_panic]
    fn test_relocations_add_overflow_panics() {
        let _ = Relocations::new(u64::MAX) + Relocations::ONE;
    }

    #[test]
    fn test_relocations_checked_and_saturating() {
        let max = Relocations::new(u64::MAX);
        assert!(max.checked_add(Relocations::ONE).is_none());
        assert_eq!(max.saturating_add(Relocations::ONE), max);
    }
}
