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

//! Physical placement rules of the yard.
//!
//! A stack is worked diagonally: to reach a container at some tier, every
//! neighbouring stack at distance `d` may hold at most `tier + 1 - d`
//! containers on the side the equipment comes from. One-way blocks are
//! approached from the left (index 0), two-way blocks from either side.

use crate::{
    block::{Block, Designation},
    location::{Location, StackLocation},
    terminal::Terminal,
};
use rand::Rng;
use std::collections::HashMap;
use yard_core::container::{Container, ContainerId};

/// Whether the top of the stack can be reached without moving neighbours.
pub fn reachable(block: &Block, stack: usize) -> bool {
    reachable_at_height(block, stack, block.height(stack))
}

/// Whether a container put on the stack could be reached, i.e. the stack is
/// reachable at the tier the new container would land on.
pub fn reachable_for_store(block: &Block, stack: usize) -> bool {
    reachable_at_height(block, stack, block.height(stack) + 1)
}

/// Whether the top of the stack can be reached coming from index 0.
pub fn reachable_from_left(block: &Block, stack: usize) -> bool {
    side_below_diagonal(block, stack, block.height(stack), 0..stack)
}

/// Whether the top of the stack can be reached coming from the far end.
/// Only two-way blocks have that side.
pub fn reachable_from_right(block: &Block, stack: usize) -> bool {
    block.is_two_way()
        && side_below_diagonal(block, stack, block.height(stack), stack + 1..block.num_stacks())
}

fn reachable_at_height(block: &Block, stack: usize, height: usize) -> bool {
    side_below_diagonal(block, stack, height, 0..stack)
        || (block.is_two_way()
            && side_below_diagonal(block, stack, height, stack + 1..block.num_stacks()))
}

fn side_below_diagonal(
    block: &Block,
    stack: usize,
    height: usize,
    mut side: std::ops::Range<usize>,
) -> bool {
    side.all(|i| {
        let h = block.height(i);
        h == 0 || h + stack.abs_diff(i) <= height
    })
}

/// Containers above the diagonal of the container at `(stack, tier)`, in
/// retrieval order: neighbours outermost first and each top-down, then the
/// target stack. Two-way blocks use the right side when it needs strictly
/// fewer moves.
pub fn blocking_containers(block: &Block, stack: usize, tier: usize) -> Vec<Container> {
    let allowed = |i: usize| (tier + 1).saturating_sub(stack.abs_diff(i));
    let above = |i: usize, out: &mut Vec<Container>| {
        if let Some(s) = block.stack(i) {
            out.extend(s.containers_above(allowed(i)).copied());
        }
    };

    let mut left = Vec::new();
    for i in 0..stack {
        above(i, &mut left);
    }

    if block.is_two_way() && !left.is_empty() {
        let mut right = Vec::new();
        for i in (stack + 1..block.num_stacks()).rev() {
            above(i, &mut right);
        }
        if right.len() < left.len() {
            if let Some(s) = block.stack(stack) {
                right.extend(s.containers_above(tier + 1).copied());
            }
            return right;
        }
    }

    if let Some(s) = block.stack(stack) {
        left.extend(s.containers_above(tier + 1).copied());
    }
    left
}

/// Bays are filled without gaps. An empty bay is seeded at its rightmost
/// stack (one-way) or its middle stack (two-way); after that a stack is
/// usable when it is occupied or extends the occupied run by one.
pub fn correct_bay_position(block: &Block, stack: usize) -> bool {
    let n = block.num_stacks();
    let occupied = |i: usize| block.height(i) > 0;

    if block.is_empty() {
        return if block.is_two_way() {
            n <= 2 || stack == n / 2
        } else {
            stack + 1 == n
        };
    }
    if occupied(stack) {
        return true;
    }

    let left_empty = !(0..stack).any(occupied);
    let extends_right = stack + 1 < n && occupied(stack + 1) && left_empty;
    if !block.is_two_way() {
        return extends_right;
    }
    let right_empty = !(stack + 1..n).any(occupied);
    extends_right || (stack > 0 && occupied(stack - 1) && right_empty)
}

/// Whether a container put at `candidate` stays out of the way of the
/// container at `target`, which is about to be retrieved.
pub fn outside_target_diagonal(
    terminal: &Terminal,
    candidate: StackLocation,
    target: Option<Location>,
) -> bool {
    let Some(target) = target else {
        return true;
    };
    if candidate.block() != target.block() {
        return true;
    }
    let Some(block) = terminal.block(candidate.block()) else {
        return false;
    };
    let (c, s) = (candidate.stack(), target.stack());
    if c == s {
        return false;
    }
    if c > s && !block.is_two_way() {
        return true;
    }
    block.height(c) + c.abs_diff(s) <= target.tier()
}

/// Every physical condition for putting a container on `candidate`.
pub fn valid_store_location(
    terminal: &Terminal,
    candidate: StackLocation,
    target: Option<Location>,
) -> bool {
    let Some(block) = terminal.block(candidate.block()) else {
        return false;
    };
    candidate.stack() < block.num_stacks()
        && block.height(candidate.stack()) < terminal.max_height()
        && target.is_none_or(|t| t.stack_location() != candidate)
        && correct_bay_position(block, candidate.stack())
        && reachable_for_store(block, candidate.stack())
        && outside_target_diagonal(terminal, candidate, target)
}

#[inline]
pub fn container_allowed_in_block(block: &Block, designation: Designation) -> bool {
    designation.is_unrestricted() || designation == block.designation()
}

/// Valid stacks within the given blocks for a container of `designation`.
pub fn valid_store_locations(
    terminal: &Terminal,
    blocks: &[usize],
    target: Option<Location>,
    designation: Designation,
) -> Vec<StackLocation> {
    let mut out = Vec::new();
    for &b in blocks {
        let Some(block) = terminal.block(b) else {
            continue;
        };
        if !container_allowed_in_block(block, designation) {
            continue;
        }
        for s in 0..block.num_stacks() {
            let candidate = StackLocation::new(b, s);
            if valid_store_location(terminal, candidate, target) {
                out.push(candidate);
            }
        }
    }
    out
}

/// Block indices eligible for a container of `designation`.
///
/// With `size == None` every block qualifies. Otherwise the window spans
/// `size` matching blocks on each side of `middle`, wrapping around; a
/// missing middle is drawn uniformly from the matching blocks. The middle is
/// always part of the window, even when it does not match itself.
pub fn corridor<R: Rng + ?Sized>(
    terminal: &Terminal,
    middle: Option<usize>,
    size: Option<usize>,
    designation: Designation,
    rng: &mut R,
) -> Vec<usize> {
    let all = 0..terminal.num_blocks();
    let Some(size) = size else {
        return all.collect();
    };

    let mut indices: Vec<usize> = if designation.is_unrestricted() {
        all.collect()
    } else {
        all.filter(|&i| terminal.block(i).is_some_and(|b| b.designation() == designation))
            .collect()
    };
    if size * 2 + 1 >= indices.len() {
        return indices;
    }

    let middle = middle.unwrap_or_else(|| indices[rng.random_range(0..indices.len())]);
    let position = match indices.binary_search(&middle) {
        Ok(p) => p,
        Err(p) => {
            indices.insert(p, middle);
            p
        }
    };

    let n = indices.len();
    let mut window = Vec::with_capacity(size * 2 + 1);
    window.push(middle);
    for i in 1..=size {
        window.push(indices[(position + i) % n]);
        window.push(indices[(position + n - i % n) % n]);
    }
    window
}

/// Block designation per container. Containers without an entry are
/// unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Designations(HashMap<ContainerId, Designation>);

impl Designations {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert(&mut self, id: ContainerId, designation: Designation) {
        self.0.insert(id, designation);
    }

    #[inline]
    pub fn get(&self, id: ContainerId) -> Designation {
        self.0.get(&id).copied().unwrap_or(Designation::UNRESTRICTED)
    }
}

impl FromIterator<(ContainerId, Designation)> for Designations {
    fn from_iter<I: IntoIterator<Item = (ContainerId, Designation)>>(iter: I) -> Self {
        Designations(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block::Access, stack::Stack};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use yard_core::container::Label;

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    fn block(heights: &[usize], access: Access) -> Block {
        let mut id = 0;
        Block::new(
            heights
                .iter()
                .map(|&h| {
                    (0..h)
                        .map(|_| {
                            id += 1;
                            c(id, 5)
                        })
                        .collect::<Stack>()
                })
                .collect(),
            access,
            Designation::UNRESTRICTED,
        )
    }

    fn set(v: Vec<usize>) -> HashSet<usize> {
        v.into_iter().collect()
    }

    #[test]
    fn test_reachable_respects_diagonal() {
        let b = block(&[1, 2, 0], Access::OneWay);
        assert!(reachable(&b, 0));
        assert!(reachable(&b, 1));
        assert!(!reachable(&b, 2));
        assert!(!reachable_for_store(&b, 2));

        let b = block(&[1, 1], Access::OneWay);
        assert!(!reachable(&b, 1));
        assert!(reachable_for_store(&b, 1));
    }

    #[test]
    fn test_two_way_reachable_from_either_side() {
        let b = block(&[3, 1, 0], Access::TwoWay);
        assert!(reachable(&b, 1));
        assert!(!reachable_from_left(&b, 1));
        assert!(reachable_from_right(&b, 1));
        let one_way = block(&[3, 1, 0], Access::OneWay);
        assert!(!reachable(&one_way, 1));
    }

    /// Every height profile of `stacks` stacks with at most `max` each.
    fn layouts(stacks: usize, max: usize) -> Vec<Vec<usize>> {
        (0..(max + 1).pow(stacks as u32))
            .map(|mut code| {
                (0..stacks)
                    .map(|_| {
                        let h = code % (max + 1);
                        code /= max + 1;
                        h
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_growth_never_makes_a_neighbour_reachable_in_any_small_layout() {
        for access in [Access::OneWay, Access::TwoWay] {
            for heights in layouts(4, 3) {
                let before = block(&heights, access);
                for j in 0..4 {
                    let after = before.stored(j, c(99, 1));
                    for i in (0..4).filter(|&i| i != j) {
                        assert!(
                            !reachable(&after, i) || reachable(&before, i),
                            "{heights:?} {access:?}: stack {i} after growing {j}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_own_top_stays_reachable_as_stack_grows() {
        for access in [Access::OneWay, Access::TwoWay] {
            for heights in layouts(4, 3) {
                let before = block(&heights, access);
                for s in 0..4 {
                    let after = before.stored(s, c(99, 1));
                    assert!(
                        !reachable(&before, s) || reachable(&after, s),
                        "{heights:?} {access:?}: stack {s}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_store_reachability_is_reachability_one_tier_up() {
        for access in [Access::OneWay, Access::TwoWay] {
            for heights in layouts(4, 3) {
                let b = block(&heights, access);
                for s in 0..4 {
                    assert_eq!(
                        reachable_for_store(&b, s),
                        reachable(&b.stored(s, c(99, 1)), s),
                        "{heights:?} {access:?}: stack {s}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_blocking_containers_include_neighbours_above_diagonal() {
        let b = Block::new(
            vec![
                Stack::new(vec![c(1, 9), c(2, 9), c(3, 9)]),
                Stack::new(vec![c(4, 1), c(5, 9)]),
            ],
            Access::OneWay,
            Designation::UNRESTRICTED,
        );
        let ids: Vec<u64> = blocking_containers(&b, 1, 0)
            .iter()
            .map(|c| c.id().value())
            .collect();
        assert_eq!(ids, vec![3, 2, 1, 5]);
    }

    #[test]
    fn test_two_way_blocking_picks_smaller_side() {
        let b = Block::new(
            vec![
                Stack::new(vec![c(1, 9), c(2, 9)]),
                Stack::new(vec![c(3, 1)]),
                Stack::empty(),
            ],
            Access::TwoWay,
            Designation::UNRESTRICTED,
        );
        assert!(blocking_containers(&b, 1, 0).is_empty());
        let one_way = Block::new(b.stacks().to_vec(), Access::OneWay, Designation::UNRESTRICTED);
        assert_eq!(blocking_containers(&one_way, 1, 0).len(), 2);
    }

    #[test]
    fn test_bay_seeding_and_gap_free_growth() {
        let empty = block(&[0, 0, 0], Access::OneWay);
        assert!(correct_bay_position(&empty, 2));
        assert!(!correct_bay_position(&empty, 0));

        let seeded = block(&[0, 0, 1], Access::OneWay);
        assert!(correct_bay_position(&seeded, 1));
        assert!(!correct_bay_position(&seeded, 0));

        let bay = block(&[0, 0, 0, 0, 0], Access::TwoWay);
        assert!(correct_bay_position(&bay, 2));
        assert!(!correct_bay_position(&bay, 1));

        let bay = block(&[0, 0, 1, 0, 0], Access::TwoWay);
        assert!(correct_bay_position(&bay, 1));
        assert!(correct_bay_position(&bay, 3));
        assert!(!correct_bay_position(&bay, 0));
        assert!(!correct_bay_position(&bay, 4));
    }

    #[test]
    fn test_valid_store_location_excludes_target_stack_and_diagonal() {
        let t = Terminal::new(
            vec![Block::new(
                vec![
                    Stack::new(vec![c(10, 10)]),
                    Stack::new(vec![c(12, 12)]),
                ],
                Access::OneWay,
                Designation::UNRESTRICTED,
            )],
            4,
        );
        let target = Location::new(0, 0, 0);
        assert!(!valid_store_location(&t, StackLocation::new(0, 0), Some(target)));
        assert!(valid_store_location(&t, StackLocation::new(0, 1), Some(target)));

        let target = Location::new(0, 1, 0);
        assert!(!valid_store_location(&t, StackLocation::new(0, 0), Some(target)));
    }

    #[test]
    fn test_full_stack_is_not_valid() {
        let t = Terminal::empty_single_stack_blocks(1, 1)
            .store(StackLocation::new(0, 0), c(1, 1))
            .unwrap();
        assert!(!valid_store_location(&t, StackLocation::new(0, 0), None));
    }

    #[test]
    fn test_corridor_windows_wrap_around() {
        let t = Terminal::empty_bays(10, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let u = Designation::UNRESTRICTED;
        assert_eq!(corridor(&t, Some(5), Some(0), u, &mut rng), vec![5]);
        assert_eq!(set(corridor(&t, Some(5), Some(1), u, &mut rng)), set(vec![4, 5, 6]));
        assert_eq!(set(corridor(&t, Some(9), Some(1), u, &mut rng)), set(vec![8, 9, 0]));
        assert_eq!(
            set(corridor(&t, Some(1), Some(2), u, &mut rng)),
            set(vec![9, 0, 1, 2, 3])
        );
        assert_eq!(corridor(&t, Some(1), None, u, &mut rng).len(), 10);
        assert_eq!(corridor(&t, None, Some(7), u, &mut rng).len(), 10);
        assert_eq!(corridor(&t, None, Some(2), u, &mut rng).len(), 5);
    }

    #[test]
    fn test_corridor_restricted_to_designation() {
        let blocks = (0..10)
            .map(|i| {
                let d = if (3..8).contains(&i) { 1 } else { 0 };
                Block::empty(5, Access::TwoWay, Designation::new(d))
            })
            .collect();
        let t = Terminal::new(blocks, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let one = Designation::new(1);
        assert_eq!(set(corridor(&t, Some(3), Some(1), one, &mut rng)), set(vec![7, 3, 4]));
        assert_eq!(
            set(corridor(&t, Some(3), Some(2), one, &mut rng)),
            set(vec![6, 7, 3, 4, 5])
        );
        let u = Designation::UNRESTRICTED;
        assert_eq!(set(corridor(&t, Some(3), Some(1), u, &mut rng)), set(vec![2, 3, 4]));
        assert_eq!(
            set(corridor(&t, Some(2), Some(3), u, &mut rng)),
            set(vec![9, 0, 1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn test_designated_blocks_filter_locations() {
        let t = Terminal::new(
            vec![
                Block::empty(1, Access::OneWay, Designation::new(2)),
                Block::empty(1, Access::OneWay, Designation::UNRESTRICTED),
            ],
            3,
        );
        let any = valid_store_locations(&t, &[0, 1], None, Designation::UNRESTRICTED);
        assert_eq!(any.len(), 2);
        let two = valid_store_locations(&t, &[0, 1], None, Designation::new(2));
        assert_eq!(two, vec![StackLocation::new(0, 0)]);
    }
}
