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

use std::{cmp::Ordering, fmt::Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        ContainerId(id)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContainerId({})", self.0)
    }
}

impl From<u64> for ContainerId {
    #[inline]
    fn from(value: u64) -> Self {
        ContainerId(value)
    }
}

/// Index of the outbound batch a container leaves with.
///
/// Smaller labels leave earlier. Containers that stay beyond the planning
/// horizon carry a label larger than every outbound batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u32);

impl Label {
    #[inline]
    pub const fn new(value: u32) -> Self {
        Label(value)
    }

    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Label({})", self.0)
    }
}

impl From<u32> for Label {
    #[inline]
    fn from(value: u32) -> Self {
        Label(value)
    }
}

/// The key containers are retrieved by: departure label first, then the
/// rank inside its outbound batch. An unrevealed rank sorts first.
pub type DepartureKey = (Label, Option<u32>);

/// An immutable container as it sits in the yard.
///
/// The rank is `None` until the handling order of its outbound batch is
/// revealed; afterwards it is the 1-based position within that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Container {
    id: ContainerId,
    label: Label,
    rank: Option<u32>,
}

impl Container {
    #[inline]
    pub const fn new(id: ContainerId, label: Label) -> Self {
        Self {
            id,
            label,
            rank: None,
        }
    }

    #[inline]
    pub const fn with_rank(id: ContainerId, label: Label, rank: Option<u32>) -> Self {
        Self { id, label, rank }
    }

    #[inline]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub const fn label(&self) -> Label {
        self.label
    }

    #[inline]
    pub const fn rank(&self) -> Option<u32> {
        self.rank
    }

    #[inline]
    pub const fn departure_key(&self) -> DepartureKey {
        (self.label, self.rank)
    }

    #[inline]
    pub const fn revealed(self, rank: Option<u32>) -> Self {
        Self { rank, ..self }
    }

    /// The same container with its identity forgotten.
    #[inline]
    pub const fn anonymized(self) -> Self {
        Self {
            id: ContainerId(0),
            ..self
        }
    }

    /// Whether `self` has to leave strictly before `other`.
    #[inline]
    pub fn departs_before(&self, other: &Container) -> bool {
        self.departure_key() < other.departure_key()
    }
}

impl PartialOrd for Container {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Container {
    fn cmp(&self, other: &Self) -> Ordering {
        self.departure_key()
            .cmp(&other.departure_key())
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{}_{}({})", self.label.0, rank, self.id.0),
            None => write!(f, "{}_?({})", self.label.0, self.id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    #[test]
    fn test_container_orders_by_label_then_rank() {
        let a = c(7, 1);
        let b = c(3, 2);
        assert!(a < b);

        let early = c(1, 1).revealed(Some(1));
        let late = c(2, 1).revealed(Some(2));
        assert!(early.departs_before(&late));
        assert!(!late.departs_before(&early));
    }

    #[test]
    fn test_unrevealed_rank_sorts_first() {
        let unknown = c(1, 4);
        let known = c(2, 4).revealed(Some(1));
        assert!(unknown.departure_key() < known.departure_key());
    }

    #[test]
    fn test_equal_keys_do_not_depart_before_each_other() {
        let a = c(1, 3);
        let b = c(2, 3);
        assert!(!a.departs_before(&b));
        assert!(!b.departs_before(&a));
        assert!(a < b);
    }

    #[test]
    fn test_anonymized_keeps_departure_key() {
        let a = c(42, 5).revealed(Some(3));
        let anon = a.anonymized();
        assert_eq!(anon.id(), ContainerId::new(0));
        assert_eq!(anon.departure_key(), a.departure_key());
    }

    #[test]
    fn test_container_display() {
        assert_eq!(format!("{}", c(9, 2)), "2_?(9)");
        assert_eq!(format!("{}", c(9, 2).revealed(Some(1))), "2_1(9)");
    }
}
