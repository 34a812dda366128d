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
    cmp::Ordering,
    collections::HashMap,
    hash::{Hash, Hasher},
};
use yard_core::container::{Container, ContainerId, Label};

/// A pile of containers, bottom first.
///
/// The blocking lower bound is computed once on construction. It counts the
/// containers that must be relocated at least once because something below
/// them leaves earlier; ties on the label contribute fractionally
/// (Galle et al., 2018). Revealed ranks do not enter the bound.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    containers: Vec<Container>,
    blocking_lower_bound: f64,
}

impl Stack {
    pub fn new(containers: Vec<Container>) -> Self {
        let blocking_lower_bound = blocking_lower_bound(&containers);
        Self {
            containers,
            blocking_lower_bound,
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    #[inline]
    pub fn top(&self) -> Option<&Container> {
        self.containers.last()
    }

    #[inline]
    pub fn blocking_lower_bound(&self) -> f64 {
        self.blocking_lower_bound
    }

    /// The container that leaves first, if any.
    pub fn min_container(&self) -> Option<&Container> {
        self.containers.iter().min_by_key(|c| c.departure_key())
    }

    /// Containers sitting above the lowest `allowed` ones, top first.
    pub fn containers_above(&self, allowed: usize) -> impl Iterator<Item = &Container> {
        let from = allowed.min(self.containers.len());
        self.containers[from..].iter().rev()
    }

    pub fn pushed(&self, container: Container) -> Stack {
        let mut containers = Vec::with_capacity(self.containers.len() + 1);
        containers.extend_from_slice(&self.containers);
        containers.push(container);
        Stack::new(containers)
    }

    pub fn popped(&self) -> Option<(Stack, Container)> {
        let (&top, rest) = self.containers.split_last()?;
        Some((Stack::new(rest.to_vec()), top))
    }

    pub fn revealed(&self, ranks: &HashMap<ContainerId, u32>) -> Stack {
        Stack::new(
            self.containers
                .iter()
                .map(|c| c.revealed(ranks.get(&c.id()).copied()))
                .collect(),
        )
    }

    pub fn anonymized(&self) -> Stack {
        Stack {
            containers: self.containers.iter().map(|c| c.anonymized()).collect(),
            blocking_lower_bound: self.blocking_lower_bound,
        }
    }
}

fn blocking_lower_bound(containers: &[Container]) -> f64 {
    let keys: Vec<Label> = containers.iter().map(|c| c.label()).collect();
    let mut well_placed = 0.0;
    for (h, key) in keys.iter().enumerate() {
        let prefix = &keys[..=h];
        let is_min = prefix.iter().all(|k| key <= k);
        if is_min {
            let ties = prefix.iter().filter(|k| *k == key).count();
            well_placed += 1.0 / ties as f64;
        }
    }
    containers.len() as f64 - well_placed
}

impl PartialEq for Stack {
    fn eq(&self, other: &Self) -> bool {
        self.containers == other.containers
    }
}

impl Eq for Stack {}

impl Hash for Stack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.containers.hash(state);
    }
}

impl PartialOrd for Stack {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Stack {
    fn cmp(&self, other: &Self) -> Ordering {
        self.containers.cmp(&other.containers)
    }
}

impl FromIterator<Container> for Stack {
    fn from_iter<I: IntoIterator<Item = Container>>(iter: I) -> Self {
        Stack::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(labels: &[u32]) -> Stack {
        labels
            .iter()
            .enumerate()
            .map(|(i, &l)| Container::new(ContainerId::new(i as u64 + 1), Label::new(l)))
            .collect()
    }

    #[test]
    fn test_sorted_stack_has_no_blocking() {
        assert_eq!(stack(&[3, 2, 1]).blocking_lower_bound(), 0.0);
        assert_eq!(stack(&[]).blocking_lower_bound(), 0.0);
    }

    #[test]
    fn test_blocking_lower_bound_counts_inversions_above_minimum() {
        assert_eq!(stack(&[1, 2]).blocking_lower_bound(), 1.0);
        assert_eq!(stack(&[1, 3, 2]).blocking_lower_bound(), 2.0);
        assert_eq!(stack(&[2, 1, 3]).blocking_lower_bound(), 1.0);
    }

    #[test]
    fn test_blocking_lower_bound_ties_on_label_ignore_ranks() {
        assert!((stack(&[1, 1]).blocking_lower_bound() - 0.5).abs() < 1e-12);
        let revealed: Stack = stack(&[1, 1])
            .containers()
            .iter()
            .enumerate()
            .map(|(i, c)| c.revealed(Some(2 - i as u32)))
            .collect();
        assert!((revealed.blocking_lower_bound() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_push_pop_round_trip() {
        let s = stack(&[4, 2]);
        let c = Container::new(ContainerId::new(99), Label::new(1));
        let (back, popped) = s.pushed(c).popped().unwrap();
        assert_eq!(back, s);
        assert_eq!(popped, c);
        assert!(Stack::empty().popped().is_none());
    }

    #[test]
    fn test_containers_above_is_top_first() {
        let s = stack(&[5, 4, 3, 2]);
        let ids: Vec<u64> = s.containers_above(1).map(|c| c.id().value()).collect();
        assert_eq!(ids, vec![4, 3, 2]);
        assert_eq!(s.containers_above(10).count(), 0);
        assert_eq!(s.containers_above(0).count(), 4);
    }

    #[test]
    fn test_min_container_uses_departure_key() {
        let s = stack(&[5, 2, 7]);
        assert_eq!(s.min_container().map(|c| c.label()), Some(Label::new(2)));
        assert!(Stack::empty().min_container().is_none());
    }

    #[test]
    fn test_anonymized_equal_up_to_identity() {
        let a = stack(&[3, 1]);
        let b: Stack = [
            Container::new(ContainerId::new(10), Label::new(3)),
            Container::new(ContainerId::new(20), Label::new(1)),
        ]
        .into_iter()
        .collect();
        assert_ne!(a, b);
        assert_eq!(a.anonymized(), b.anonymized());
    }
}
