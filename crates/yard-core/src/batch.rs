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

use crate::container::Container;
use rand::{Rng, seq::SliceRandom};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    #[inline]
    pub const fn is_inbound(&self) -> bool {
        matches!(self, Direction::Inbound)
    }

    /// Even batch indices arrive, odd ones leave.
    #[inline]
    pub const fn alternating(index: usize) -> Self {
        if index % 2 == 0 {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "in"),
            Direction::Outbound => write!(f, "out"),
        }
    }
}

/// A planned group of containers handled together. The order in which
/// they are handled is unknown until the batch is realized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Batch {
    direction: Direction,
    containers: Vec<Container>,
}

impl Batch {
    #[inline]
    pub fn new(direction: Direction, containers: Vec<Container>) -> Self {
        Self {
            direction,
            containers,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_inbound(&self) -> bool {
        self.direction.is_inbound()
    }

    #[inline]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Draws one handling order uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RealizedBatch {
        let mut containers = self.containers.clone();
        containers.shuffle(rng);
        RealizedBatch::new(self.direction, containers)
    }

    /// Every handling order of the batch, each equally likely.
    ///
    /// Orders that look alike are kept separately so averaging over the
    /// result stays an unbiased expectation.
    pub fn permutations(&self) -> Vec<RealizedBatch> {
        permutations(&self.containers)
            .into_iter()
            .map(|order| RealizedBatch::new(self.direction, order))
            .collect()
    }

    /// Number of distinct handling orders, `n!`, saturating at `u128::MAX`.
    pub fn realizations(&self) -> u128 {
        (1..=self.containers.len() as u128).fold(1u128, |acc, k| acc.saturating_mul(k))
    }
}

impl Display for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ ")?;
        for (i, c) in self.containers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, " }}{}", self.direction)
    }
}

/// One concrete handling order of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RealizedBatch {
    direction: Direction,
    containers: Vec<Container>,
}

impl RealizedBatch {
    #[inline]
    pub fn new(direction: Direction, containers: Vec<Container>) -> Self {
        Self {
            direction,
            containers,
        }
    }

    #[inline]
    pub fn inbound(containers: Vec<Container>) -> Self {
        Self::new(Direction::Inbound, containers)
    }

    #[inline]
    pub fn outbound(containers: Vec<Container>) -> Self {
        Self::new(Direction::Outbound, containers)
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_inbound(&self) -> bool {
        self.direction.is_inbound()
    }

    #[inline]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl Display for RealizedBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[ ")?;
        for (i, c) in self.containers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, " ]{}", self.direction)
    }
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    let mut out = Vec::new();
    loop {
        out.push(indices.iter().map(|&i| items[i].clone()).collect());
        if !next_permutation(&mut indices) {
            return out;
        }
    }
}

fn next_permutation(indices: &mut [usize]) -> bool {
    let n = indices.len();
    if n < 2 {
        return false;
    }
    let mut i = n - 1;
    while i > 0 && indices[i - 1] >= indices[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = n - 1;
    while indices[j] <= indices[i - 1] {
        j -= 1;
    }
    indices.swap(i - 1, j);
    indices[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerId, Label};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn batch(ids: &[u64]) -> Batch {
        Batch::new(
            Direction::Outbound,
            ids.iter()
                .map(|&id| Container::new(ContainerId::new(id), Label::new(1)))
                .collect(),
        )
    }

    #[test]
    fn test_permutations_cover_all_orders() {
        let b = batch(&[1, 2, 3]);
        let perms = b.permutations();
        assert_eq!(perms.len(), 6);
        assert_eq!(b.realizations(), 6);

        let distinct: HashSet<Vec<u64>> = perms
            .iter()
            .map(|p| p.containers().iter().map(|c| c.id().value()).collect())
            .collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn test_empty_batch_has_single_realization() {
        let b = batch(&[]);
        let perms = b.permutations();
        assert_eq!(perms.len(), 1);
        assert!(perms[0].is_empty());
        assert_eq!(b.realizations(), 1);
    }

    #[test]
    fn test_realizations_saturate_for_large_batches() {
        assert_eq!(batch(&(1..=34).collect::<Vec<u64>>()).realizations(), (1..=34u128).product());
        assert_eq!(batch(&(1..=35).collect::<Vec<u64>>()).realizations(), u128::MAX);
        assert_eq!(batch(&(1..=60).collect::<Vec<u64>>()).realizations(), u128::MAX);
    }

    #[test]
    fn test_sample_is_a_permutation() {
        let b = batch(&[4, 5, 6, 7]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let r = b.sample(&mut rng);
            let mut ids: Vec<u64> = r.containers().iter().map(|c| c.id().value()).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![4, 5, 6, 7]);
            assert_eq!(r.direction(), Direction::Outbound);
        }
    }

    #[test]
    fn test_alternating_direction() {
        assert!(Direction::alternating(0).is_inbound());
        assert!(!Direction::alternating(1).is_inbound());
        assert!(Direction::alternating(4).is_inbound());
    }
}
