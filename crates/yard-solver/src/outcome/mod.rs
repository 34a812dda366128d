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

//! Enumeration of the states a batch can lead to.
//!
//! Inbound batches only place containers and never cost anything. Outbound
//! batches move every blocker of a target out of the way one at a time, each
//! move costing one relocation and branching into every legal spot. States
//! are deduplicated by progress and abstract key, keeping the cheapest path
//! to each.

pub mod myopic;
pub mod optimized;

use crate::err::{InconsistentStateError, NoSolutionError, SolveError};
use rand::Rng;
use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};
use yard_core::{
    batch::RealizedBatch,
    container::{Container, ContainerId},
    cost::Relocations,
};
use yard_model::{
    block::{Block, Designation},
    err::{ContainerNotFoundError, TerminalError},
    location::{Location, StackLocation},
    placement::{container_allowed_in_block, corridor, valid_store_location, Designations},
    terminal::{AbstractTerminal, Terminal},
};

/// Where containers may go: an optional corridor half-width and the block
/// designation of every container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementScope {
    corridor_size: Option<usize>,
    designations: Designations,
}

impl PlacementScope {
    #[inline]
    pub fn new(corridor_size: Option<usize>, designations: Designations) -> Self {
        Self {
            corridor_size,
            designations,
        }
    }

    /// Every block, every container anywhere.
    #[inline]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    #[inline]
    pub fn corridor_size(&self) -> Option<usize> {
        self.corridor_size
    }

    #[inline]
    pub fn designations(&self) -> &Designations {
        &self.designations
    }

    #[inline]
    pub fn designation(&self, id: ContainerId) -> Designation {
        self.designations.get(id)
    }
}

/// A state a batch can end in together with the relocations it took.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Outcome {
    terminal: Terminal,
    cost: Relocations,
}

impl Outcome {
    #[inline]
    pub fn new(terminal: Terminal, cost: Relocations) -> Self {
        Self { terminal, cost }
    }

    #[inline]
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    #[inline]
    pub fn cost(&self) -> Relocations {
        self.cost
    }

    #[inline]
    pub fn into_parts(self) -> (Terminal, Relocations) {
        (self.terminal, self.cost)
    }
}

pub(crate) fn inconsistent<E: Into<TerminalError>>(
    error: E,
    start: &Terminal,
    current: &Terminal,
) -> SolveError {
    InconsistentStateError::new(error.into(), start.clone(), current.clone()).into()
}

/// Finds a container that must be in the yard.
pub(crate) fn locate(
    terminal: &Terminal,
    id: ContainerId,
    start: &Terminal,
) -> Result<Location, SolveError> {
    terminal
        .container_location(id)
        .map_err(|e| inconsistent(e, start, terminal))
}

/// Takes the top of `from`, which has to be container `expected`.
pub(crate) fn take(
    terminal: &Terminal,
    from: StackLocation,
    expected: ContainerId,
    start: &Terminal,
) -> Result<(Terminal, Container), SolveError> {
    let (after, container) = terminal
        .retrieve(from)
        .map_err(|e| inconsistent(e, start, terminal))?;
    if container.id() != expected {
        return Err(inconsistent(ContainerNotFoundError::new(expected), start, terminal));
    }
    Ok((after, container))
}

/// Every terminal reachable by putting `container` on one legal stack.
///
/// Blocks outside the corridor around the target's block, or not matching
/// the container's designation, are skipped. Blocks identical up to
/// abstraction yield identical outcomes, so only the first of them is
/// expanded; the target's own block is always expanded because the target
/// constrains it.
///
/// A legal spot that refuses the container means the yard and the
/// placement rules disagree, which is reported as an inconsistent state.
pub fn store_outcomes<R: Rng + ?Sized>(
    terminal: &Terminal,
    container: Container,
    target: Option<Location>,
    scope: &PlacementScope,
    rng: &mut R,
) -> Result<Vec<Terminal>, SolveError> {
    let designation = scope.designation(container.id());
    let blocks = corridor(
        terminal,
        target.map(|t| t.block()),
        scope.corridor_size(),
        designation,
        rng,
    );

    let mut visited: HashSet<Block> = HashSet::new();
    let mut out = Vec::new();
    for b in blocks {
        let Some(block) = terminal.block(b) else {
            continue;
        };
        if !container_allowed_in_block(block, designation) {
            continue;
        }
        let is_target_block = target.is_some_and(|t| t.block() == b);
        if !is_target_block && !visited.insert(block.abstracted()) {
            continue;
        }
        for s in 0..block.num_stacks() {
            let candidate = StackLocation::new(b, s);
            if !valid_store_location(terminal, candidate, target) {
                continue;
            }
            let next = terminal
                .store(candidate, container)
                .map_err(|e| inconsistent(e, terminal, terminal))?;
            out.push(next);
        }
    }
    Ok(out)
}

/// One step of retrieving `container`: if something blocks it, the first
/// blocker is moved and every landing spot is returned with `true`;
/// otherwise the container itself leaves and the single result comes with
/// `false`.
pub fn handle_outbound_container<R: Rng + ?Sized>(
    terminal: &Terminal,
    container: Container,
    scope: &PlacementScope,
    rng: &mut R,
) -> Result<(Vec<Terminal>, bool), SolveError> {
    let location = locate(terminal, container.id(), terminal)?;
    let blocking = terminal.blocking_containers(location);

    if let Some(first) = blocking.first() {
        let from = locate(terminal, first.id(), terminal)?.stack_location();
        let (after, moved) = take(terminal, from, first.id(), terminal)?;
        return Ok((store_outcomes(&after, moved, Some(location), scope, rng)?, true));
    }

    let (after, _) = take(terminal, location.stack_location(), container.id(), terminal)?;
    Ok((vec![after], false))
}

struct Node {
    progress: usize,
    cost: Relocations,
    seq: u64,
    terminal: Terminal,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Max-heap: furthest progress first, then cheapest, then oldest.
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.progress
            .cmp(&other.progress)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// All distinct end states of a realized batch with their cost.
///
/// Outbound batches reveal their order on the terminal first. Branches
/// costing more than the cheapest complete one found so far are dropped.
/// An empty batch leaves the terminal as it is.
pub fn unique_outcomes<R: Rng + ?Sized>(
    terminal: &Terminal,
    batch: &RealizedBatch,
    scope: &PlacementScope,
    rng: &mut R,
) -> Result<Vec<Outcome>, SolveError> {
    if batch.is_empty() {
        return Ok(vec![Outcome::new(terminal.clone(), Relocations::new(0))]);
    }

    let start = if batch.is_inbound() {
        terminal.clone()
    } else {
        terminal.reveal_order(batch.containers())
    };

    let mut seq = 0u64;
    let mut queue = BinaryHeap::new();
    queue.push(Node {
        progress: 0,
        cost: Relocations::new(0),
        seq,
        terminal: start,
    });
    let mut cheapest: HashMap<(usize, AbstractTerminal), Relocations> = HashMap::new();
    let mut ends: HashMap<AbstractTerminal, usize> = HashMap::new();
    let mut best: Option<Relocations> = None;
    let mut out: Vec<Outcome> = Vec::new();

    while let Some(node) = queue.pop() {
        if best.is_some_and(|b| node.cost > b) {
            continue;
        }
        let key = node.terminal.abstract_key();
        // Superseded by a cheaper path to the same state.
        if cheapest
            .get(&(node.progress, key.clone()))
            .is_some_and(|&c| c < node.cost)
        {
            continue;
        }
        if node.progress == batch.len() {
            best = Some(best.map_or(node.cost, |b| b.min(node.cost)));
            match ends.get(&key) {
                Some(&i) if out[i].cost() <= node.cost => {}
                Some(&i) => out[i] = Outcome::new(node.terminal, node.cost),
                None => {
                    ends.insert(key, out.len());
                    out.push(Outcome::new(node.terminal, node.cost));
                }
            }
            continue;
        }

        let container = batch.containers()[node.progress];
        let (children, relocated) = if batch.is_inbound() {
            (
                store_outcomes(&node.terminal, container, None, scope, rng)?,
                false,
            )
        } else {
            handle_outbound_container(&node.terminal, container, scope, rng)?
        };

        let (progress, cost) = if relocated {
            (node.progress, node.cost.increment())
        } else {
            (node.progress + 1, node.cost)
        };
        for child in children {
            let key = (progress, child.abstract_key());
            if cheapest.get(&key).is_some_and(|&c| c <= cost) {
                continue;
            }
            cheapest.insert(key, cost);
            seq += 1;
            queue.push(Node {
                progress,
                cost,
                seq,
                terminal: child,
            });
        }
    }

    if out.is_empty() {
        return Err(NoSolutionError::new().into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use yard_core::container::Label;
    use yard_model::{block::Access, stack::Stack};

    pub(crate) fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    fn scenario() -> Terminal {
        Terminal::new(
            vec![Block::new(
                vec![
                    Stack::new(vec![c(10, 10), c(11, 11)]),
                    Stack::new(vec![c(12, 12)]),
                ],
                Access::OneWay,
                Designation::UNRESTRICTED,
            )],
            4,
        )
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(17)
    }

    #[test]
    fn test_single_inbound_container_into_empty_block_collapses() {
        let t = Terminal::new(vec![Block::empty(4, Access::OneWay, Designation::UNRESTRICTED)], 4);
        let batch = RealizedBatch::inbound(vec![c(1, 1)]);
        let outcomes = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].cost(), Relocations::new(0));
    }

    #[test]
    fn test_identical_blocks_expand_once() {
        let t = Terminal::empty_single_stack_blocks(5, 3);
        let outs = store_outcomes(&t, c(1, 1), None, &PlacementScope::unrestricted(), &mut rng()).unwrap();
        assert_eq!(outs.len(), 1);
    }

    #[test]
    fn test_retrieving_blocked_container_costs_one() {
        let t = scenario();
        let batch = RealizedBatch::outbound(vec![c(10, 10)]);
        let outcomes = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng()).unwrap();
        assert!(!outcomes.is_empty());
        for o in &outcomes {
            assert_eq!(o.cost(), Relocations::ONE);
            assert!(o.terminal().container_location(ContainerId::new(10)).is_err());
            let moved = o.terminal().container_location(ContainerId::new(11)).unwrap();
            assert_eq!(moved.stack_location(), StackLocation::new(0, 1));
        }
    }

    #[test]
    fn test_unblocked_retrieval_is_free() {
        let t = scenario();
        let batch = RealizedBatch::outbound(vec![c(11, 11), c(10, 10)]);
        let outcomes = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].cost(), Relocations::new(0));
        assert_eq!(outcomes[0].terminal().num_containers(), 1);
    }

    #[test]
    fn test_empty_batch_keeps_terminal() {
        let t = scenario();
        let outcomes = unique_outcomes(
            &t,
            &RealizedBatch::inbound(vec![]),
            &PlacementScope::unrestricted(),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(outcomes, vec![Outcome::new(t, Relocations::new(0))]);
    }

    #[test]
    fn test_full_yard_has_no_solution() {
        let t = Terminal::empty_single_stack_blocks(1, 1)
            .store(StackLocation::new(0, 0), c(1, 1))
            .unwrap();
        let batch = RealizedBatch::inbound(vec![c(2, 1)]);
        let err = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng());
        assert!(matches!(err, Err(SolveError::NoSolution(_))));
    }

    #[test]
    fn test_missing_container_is_inconsistent() {
        let t = scenario();
        let batch = RealizedBatch::outbound(vec![c(99, 1)]);
        let err = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng());
        assert!(matches!(err, Err(SolveError::Inconsistent(_))));
    }

    #[test]
    fn test_store_refused_on_legal_spot_is_inconsistent() {
        let t = scenario();
        let err = store_outcomes(&t, c(10, 10), None, &PlacementScope::unrestricted(), &mut rng());
        assert!(matches!(err, Err(SolveError::Inconsistent(_))));
    }

    /// Moving the blocker onto the wrong stack first reaches the end state
    /// after two relocations; the direct route reaches it after one.
    pub(crate) fn late_cheap_path() -> (Terminal, RealizedBatch) {
        let single = |stack: Vec<Container>| {
            Block::new(vec![Stack::new(stack)], Access::OneWay, Designation::UNRESTRICTED)
        };
        let t = Terminal::new(
            vec![
                single(vec![c(1, 0), c(2, 5)]),
                single(vec![c(3, 0)]),
                single(vec![c(4, 9)]),
            ],
            3,
        );
        (t, RealizedBatch::outbound(vec![c(1, 0), c(3, 0)]))
    }

    #[test]
    fn test_later_cheaper_path_replaces_known_state() {
        let (t, batch) = late_cheap_path();
        let outcomes = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng()).unwrap();

        let single = |stack: Vec<Container>| {
            Block::new(vec![Stack::new(stack)], Access::OneWay, Designation::UNRESTRICTED)
        };
        let direct = Terminal::new(
            vec![single(vec![]), single(vec![]), single(vec![c(4, 9), c(2, 5)])],
            3,
        )
        .abstract_key();

        let found: Vec<&Outcome> = outcomes
            .iter()
            .filter(|o| o.terminal().abstract_key() == direct)
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].cost(), Relocations::ONE);
        assert_eq!(outcomes.iter().map(Outcome::cost).min(), Some(Relocations::ONE));

        let keys: HashSet<AbstractTerminal> =
            outcomes.iter().map(|o| o.terminal().abstract_key()).collect();
        assert_eq!(keys.len(), outcomes.len());
    }

    #[test]
    fn test_designations_restrict_blocks() {
        let t = Terminal::new(
            vec![
                Block::empty(1, Access::OneWay, Designation::new(1)),
                Block::empty(1, Access::OneWay, Designation::new(2)),
            ],
            2,
        );
        let designations: Designations =
            [(ContainerId::new(1), Designation::new(2))].into_iter().collect();
        let scope = PlacementScope::new(None, designations);
        let outs = store_outcomes(&t, c(1, 1), None, &scope, &mut rng()).unwrap();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].stack_height(StackLocation::new(1, 0)), 1);
    }

    #[test]
    fn test_outcomes_are_abstractly_distinct() {
        let t = Terminal::empty_bays(2, 3);
        let batch = RealizedBatch::inbound(vec![c(1, 2), c(2, 1), c(3, 2)]);
        let outcomes = unique_outcomes(&t, &batch, &PlacementScope::unrestricted(), &mut rng()).unwrap();
        let keys: HashSet<AbstractTerminal> =
            outcomes.iter().map(|o| o.terminal().abstract_key()).collect();
        assert_eq!(keys.len(), outcomes.len());
        assert!(outcomes.iter().all(|o| o.terminal().num_containers() == 3));
    }
}
