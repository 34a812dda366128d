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

//! The MM placement rule.
//!
//! A container goes, in order of preference, onto the stack whose earliest
//! departing container leaves soonest after it, onto an empty stack, or onto
//! the stack whose earliest departing container leaves last. The adopted
//! variant refuses the first option when the spot could block later on.

use super::PlacementRule;
use crate::{
    err::{NoSolutionError, SolveError},
    outcome::{inconsistent, locate, take},
};
use std::collections::HashSet;
use tracing::{trace, warn};
use yard_core::{
    container::{Container, ContainerId},
    cost::Relocations,
};
use yard_model::{
    block::Designation,
    location::{Location, StackLocation},
    placement::{reachable_from_left, reachable_from_right, valid_store_locations, Designations},
    terminal::Terminal,
};

/// What the cost simulations report when they get stuck.
pub const SIMULATION_FAILURE_COST: Relocations = Relocations::new(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MmVariant {
    #[default]
    Standard,
    Adopted,
}

/// Whether putting `container` on `location` risks blocking it later: the
/// stack itself, or a neighbour inside the diagonal on a side the stack is
/// reachable from, holds a container leaving no later than `container`.
pub fn potential_blocking(
    terminal: &Terminal,
    location: StackLocation,
    container: &Container,
) -> bool {
    let Some(block) = terminal.block(location.block()) else {
        return false;
    };
    let s = location.stack();
    let height = block.height(s);
    let leaves_no_later = |c: &Container| c.label() <= container.label();

    let within_diagonal = |i: usize| {
        block.stack(i).is_some_and(|stack| {
            let reach = (height + s.abs_diff(i)).min(stack.height());
            stack.containers()[..reach].iter().any(leaves_no_later)
        })
    };

    if block
        .stack(s)
        .is_some_and(|stack| stack.containers().iter().any(leaves_no_later))
    {
        return true;
    }
    if reachable_from_left(block, s) && (s..block.num_stacks()).any(within_diagonal) {
        return true;
    }
    reachable_from_right(block, s) && (0..s).any(within_diagonal)
}

/// The stack the MM rule picks among the legal ones in `blocks`.
pub fn mm_store_location(
    terminal: &Terminal,
    container: &Container,
    target: Option<Location>,
    blocks: &[usize],
    designation: Designation,
    variant: MmVariant,
) -> Option<StackLocation> {
    let candidates = valid_store_locations(terminal, blocks, target, designation);
    let earliest = |loc: &StackLocation| {
        terminal
            .stack(*loc)
            .and_then(|s| s.min_container())
            .map(|m| (m.label(), m.departure_key(), *loc))
    };

    let no_new_blocking = candidates
        .iter()
        .filter_map(earliest)
        .filter(|(label, _, loc)| {
            *label > container.label()
                && (variant == MmVariant::Standard
                    || !potential_blocking(terminal, *loc, container))
        })
        .map(|(_, key, loc)| (key, loc))
        .min();
    if let Some((_, loc)) = no_new_blocking {
        return Some(loc);
    }

    if let Some(&loc) = candidates.iter().find(|l| terminal.stack_height(**l) == 0) {
        return Some(loc);
    }

    candidates
        .iter()
        .filter_map(earliest)
        .map(|(_, key, loc)| (key, loc))
        .max()
        .map(|(_, loc)| loc)
}

/// Puts `container` where the MM rule says.
pub fn mm_store(
    terminal: &Terminal,
    container: Container,
    target: Option<Location>,
    blocks: &[usize],
    designation: Designation,
    variant: MmVariant,
) -> Result<Terminal, SolveError> {
    let location = mm_store_location(terminal, &container, target, blocks, designation, variant)
        .ok_or_else(|| NoSolutionError::new().with_container(container.id()))?;
    terminal
        .store(location, container)
        .map_err(|e| inconsistent(e, terminal, terminal))
}

fn retrieval_order(terminal: &Terminal, blocks: &[usize]) -> Vec<Container> {
    let mut order: Vec<Container> = blocks
        .iter()
        .filter_map(|&b| terminal.block(b))
        .flat_map(|b| b.stacks().iter().flat_map(|s| s.containers().iter().copied()))
        .collect();
    order.sort_by_key(|c| c.departure_key());
    order
}

fn or_failure_cost(result: Result<Relocations, SolveError>, what: &str) -> Relocations {
    match result {
        Ok(cost) => cost,
        Err(SolveError::NoSolution(e)) => {
            trace!(%e, "{} simulation got stuck", what);
            SIMULATION_FAILURE_COST
        }
        Err(e) => {
            warn!(%e, "{} simulation hit an inconsistent yard", what);
            SIMULATION_FAILURE_COST
        }
    }
}

/// Relocations needed to empty the given blocks in departure order when
/// every blocker is put away by the MM rule.
pub fn mm_retrieval_cost(
    terminal: &Terminal,
    blocks: &[usize],
    designations: &Designations,
    variant: MmVariant,
) -> Relocations {
    or_failure_cost(simulate_mm(terminal, blocks, designations, variant), "MM")
}

fn simulate_mm(
    terminal: &Terminal,
    blocks: &[usize],
    designations: &Designations,
    variant: MmVariant,
) -> Result<Relocations, SolveError> {
    let mut current = terminal.clone();
    let mut total = Relocations::new(0);
    for target in retrieval_order(terminal, blocks) {
        let location = locate(&current, target.id(), terminal)?;
        let blocking = current.blocking_containers(location);
        total += Relocations::from(blocking.len());
        for blocker in blocking {
            let from = locate(&current, blocker.id(), terminal)?.stack_location();
            let (after, moved) = take(&current, from, blocker.id(), terminal)?;
            current = mm_store(
                &after,
                moved,
                Some(location),
                blocks,
                designations.get(moved.id()),
                variant,
            )?;
        }
        current = take(&current, location.stack_location(), target.id(), terminal)?.0;
    }
    Ok(total)
}

/// Lower-bound flavoured count: every blocker costs one move, plus one more
/// when no legal stack could take it without it blocking again. Blockers
/// are taken out of the yard instead of being put back.
pub fn crl_cost(terminal: &Terminal, blocks: &[usize], designations: &Designations) -> Relocations {
    or_failure_cost(simulate_crl(terminal, blocks, designations), "CRL")
}

fn simulate_crl(
    terminal: &Terminal,
    blocks: &[usize],
    designations: &Designations,
) -> Result<Relocations, SolveError> {
    let mut current = terminal.clone();
    let mut total = Relocations::new(0);
    let mut removed: HashSet<ContainerId> = HashSet::new();
    for target in retrieval_order(terminal, blocks) {
        if removed.contains(&target.id()) {
            continue;
        }
        let location = locate(&current, target.id(), terminal)?;
        let blocking = current.blocking_containers(location);
        total += Relocations::from(blocking.len());
        for blocker in blocking {
            let from = locate(&current, blocker.id(), terminal)?.stack_location();
            current = take(&current, from, blocker.id(), terminal)?.0;
            removed.insert(blocker.id());
            let designation = designations.get(blocker.id());
            if !has_harmless_spot(&current, &blocker, location, blocks, designation) {
                total = total.increment();
            }
        }
        current = take(&current, location.stack_location(), target.id(), terminal)?.0;
        removed.insert(target.id());
    }
    Ok(total)
}

fn has_harmless_spot(
    terminal: &Terminal,
    container: &Container,
    target: Location,
    blocks: &[usize],
    designation: Designation,
) -> bool {
    valid_store_locations(terminal, blocks, Some(target), designation)
        .into_iter()
        .any(|loc| {
            terminal
                .stack(loc)
                .and_then(|s| s.min_container())
                .is_none_or(|m| m.label() >= container.label())
        })
}

/// The MM rule as a stand-alone placement policy over the whole yard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MmRule {
    variant: MmVariant,
}

impl MmRule {
    #[inline]
    pub fn new(variant: MmVariant) -> Self {
        Self { variant }
    }

    #[inline]
    pub fn variant(&self) -> MmVariant {
        self.variant
    }
}

impl PlacementRule for MmRule {
    fn place(
        &self,
        terminal: &Terminal,
        container: Container,
        target: Option<Location>,
        designation: Designation,
    ) -> Result<Terminal, SolveError> {
        let blocks: Vec<usize> = (0..terminal.num_blocks()).collect();
        mm_store(terminal, container, target, &blocks, designation, self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yard_core::container::Label;
    use yard_model::{
        block::{Access, Block},
        stack::Stack,
    };

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    fn all(t: &Terminal) -> Vec<usize> {
        (0..t.num_blocks()).collect()
    }

    fn stacked(stacks: &[&[(u64, u32)]]) -> Terminal {
        Terminal::new(
            stacks
                .iter()
                .map(|s| {
                    Block::new(
                        vec![s.iter().map(|&(id, l)| c(id, l)).collect::<Stack>()],
                        Access::OneWay,
                        Designation::UNRESTRICTED,
                    )
                })
                .collect(),
            4,
        )
    }

    #[test]
    fn test_mm_prefers_earliest_later_departing_stack() {
        let t = stacked(&[&[(1, 5)], &[(2, 3)], &[(3, 1)], &[]]);
        let loc = mm_store_location(
            &t,
            &c(9, 2),
            None,
            &all(&t),
            Designation::UNRESTRICTED,
            MmVariant::Standard,
        );
        assert_eq!(loc, Some(StackLocation::new(1, 0)));
    }

    #[test]
    fn test_mm_falls_back_to_empty_then_least_harmful() {
        let t = stacked(&[&[(1, 1)], &[(2, 3)], &[]]);
        let u = Designation::UNRESTRICTED;
        let loc = mm_store_location(&t, &c(9, 4), None, &all(&t), u, MmVariant::Standard);
        assert_eq!(loc, Some(StackLocation::new(2, 0)));

        let t = stacked(&[&[(1, 1)], &[(2, 3)]]);
        let loc = mm_store_location(&t, &c(9, 4), None, &all(&t), u, MmVariant::Standard);
        assert_eq!(loc, Some(StackLocation::new(1, 0)));
    }

    #[test]
    fn test_adopted_variant_avoids_potential_blocking() {
        let t = Terminal::new(
            vec![Block::new(
                vec![
                    Stack::empty(),
                    Stack::empty(),
                    Stack::new(vec![c(1, 6)]),
                    Stack::new(vec![c(2, 7), c(3, 1)]),
                    Stack::empty(),
                ],
                Access::TwoWay,
                Designation::UNRESTRICTED,
            )],
            4,
        );
        assert!(potential_blocking(&t, StackLocation::new(0, 2), &c(9, 5)));
        let u = Designation::UNRESTRICTED;
        let standard = mm_store_location(&t, &c(9, 5), None, &[0], u, MmVariant::Standard);
        assert_eq!(standard, Some(StackLocation::new(0, 2)));
        let adopted = mm_store_location(&t, &c(9, 5), None, &[0], u, MmVariant::Adopted);
        assert_ne!(adopted, Some(StackLocation::new(0, 2)));
    }

    #[test]
    fn test_mm_retrieval_cost_counts_relocations() {
        let t = stacked(&[&[(1, 1), (2, 2)], &[]]);
        let cost = mm_retrieval_cost(&t, &all(&t), &Designations::new(), MmVariant::Standard);
        assert_eq!(cost, Relocations::new(1));
        let sorted = stacked(&[&[(2, 2), (1, 1)], &[]]);
        let cost = mm_retrieval_cost(&sorted, &all(&sorted), &Designations::new(), MmVariant::Standard);
        assert_eq!(cost, Relocations::new(0));
    }

    #[test]
    fn test_mm_retrieval_cost_reports_failure() {
        let t = stacked(&[&[(1, 1), (2, 2)]]);
        let cost = mm_retrieval_cost(&t, &all(&t), &Designations::new(), MmVariant::Standard);
        assert_eq!(cost, SIMULATION_FAILURE_COST);
    }

    #[test]
    fn test_crl_adds_one_for_unavoidable_second_move() {
        let harmless = stacked(&[&[(1, 1), (2, 3)], &[]]);
        let cost = crl_cost(&harmless, &all(&harmless), &Designations::new());
        assert_eq!(cost, Relocations::new(1));

        let forced = stacked(&[&[(1, 1), (2, 3)], &[(3, 2)]]);
        let cost = crl_cost(&forced, &all(&forced), &Designations::new());
        assert_eq!(cost, Relocations::new(2));
    }

    #[test]
    fn test_mm_rule_places_through_trait() {
        let t = stacked(&[&[(1, 5)], &[]]);
        let rule = MmRule::new(MmVariant::Adopted);
        let placed = rule
            .place(&t, c(9, 2), None, Designation::UNRESTRICTED)
            .unwrap();
        assert_eq!(placed.num_containers(), 2);
    }
}
