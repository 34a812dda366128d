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

//! Exact expected relocations by probabilistic best-first search.
//!
//! The planned events form a tree of chance nodes (which realization of the
//! next batch happens, all equally likely) and decision nodes (which legal
//! move handles the next container). Chance nodes average, decision nodes
//! minimize. Decision children are explored in order of an admissible lower
//! bound and cut off as soon as the bound reaches the best value found.
//! Both node kinds are memoized on the abstract yard.

use crate::{
    err::{NoSolutionError, SolveError},
    expectation::Expectation,
    outcome::{handle_outbound_container, store_outcomes, unique_outcomes, Outcome, PlacementScope},
    policy::Policy,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
};
use tracing::{debug, info, instrument, trace};
use yard_core::{batch::RealizedBatch, container::Label, cost::Relocations};
use yard_model::{
    events::Events,
    terminal::{AbstractTerminal, Terminal},
};

/// `(batch, realization index, containers handled, state)`.
type DecisionKey = (usize, usize, usize, AbstractTerminal);

/// Solves a scenario exactly on construction and then acts optimally.
///
/// Placement is unrestricted: every block is eligible for every container.
#[derive(Debug, Clone)]
pub struct Pbfs {
    events: Events,
    scope: PlacementScope,
    rng: ChaCha8Rng,
    horizon: HashSet<Label>,
    chance: HashMap<(usize, AbstractTerminal), Expectation>,
    decisions: HashMap<DecisionKey, Expectation>,
    expected: Expectation,
}

impl Pbfs {
    /// Runs the search from `initial`. Fails when some realization of the
    /// events cannot be handled at all.
    #[instrument(skip_all, fields(batches = events.len()), err(Display))]
    pub fn new(events: Events, initial: &Terminal) -> Result<Self, SolveError> {
        let horizon = events
            .batches()
            .iter()
            .filter(|b| !b.is_inbound())
            .flat_map(|b| b.containers().iter().map(|c| c.label()))
            .collect();
        let mut pbfs = Self {
            events,
            scope: PlacementScope::unrestricted(),
            rng: ChaCha8Rng::seed_from_u64(0),
            horizon,
            chance: HashMap::new(),
            decisions: HashMap::new(),
            expected: Expectation::Infinite,
        };

        let expected = pbfs.chance_value(0, initial)?;
        info!(
            %expected,
            chance_nodes = pbfs.chance.len(),
            decision_nodes = pbfs.decisions.len(),
            "search finished"
        );
        if !expected.is_finite() {
            return Err(NoSolutionError::new().into());
        }
        pbfs.expected = expected;
        Ok(pbfs)
    }

    /// The optimal expected number of relocations from the initial yard.
    #[inline]
    pub fn expected_relocations(&self) -> &Expectation {
        &self.expected
    }

    #[inline]
    pub fn events(&self) -> &Events {
        &self.events
    }

    /// Expected value of the chance node `(t, terminal)`, if the search
    /// reached it.
    pub fn cached_value(&self, t: usize, terminal: &Terminal) -> Option<&Expectation> {
        self.chance.get(&(t, terminal.abstract_key()))
    }

    /// Relocations every completion has to make, in expectation.
    ///
    /// A container has to move at least once when something below it leaves
    /// within the planning horizon strictly before it. A container leaving
    /// within the horizon on top of `m` containers of the same unrevealed
    /// batch order is called first among them with probability `1/(m + 1)`.
    pub fn lower_bound(&self, terminal: &Terminal) -> BigRational {
        let in_horizon = |label: Label| self.horizon.contains(&label);
        let mut bound = BigRational::zero();
        for stack in terminal.blocks().flat_map(|b| b.stacks().iter()) {
            let containers = stack.containers();
            for (h, c) in containers.iter().enumerate() {
                let below = &containers[..h];
                if below
                    .iter()
                    .any(|b| in_horizon(b.label()) && b.departs_before(c))
                {
                    bound += BigRational::one();
                } else if in_horizon(c.label()) {
                    let m = below
                        .iter()
                        .filter(|b| b.departure_key() == c.departure_key())
                        .count();
                    if m > 0 {
                        bound += BigRational::new(BigInt::from(m), BigInt::from(m + 1));
                    }
                }
            }
        }
        bound
    }

    fn chance_value(&mut self, t: usize, terminal: &Terminal) -> Result<Expectation, SolveError> {
        let key = (t, terminal.abstract_key());
        if let Some(value) = self.chance.get(&key) {
            return Ok(value.clone());
        }
        let Some(batch) = self.events.batch(t).cloned() else {
            self.chance.insert(key, Expectation::zero());
            return Ok(Expectation::zero());
        };

        let mut values = Vec::new();
        for (perm, realized) in batch.permutations().into_iter().enumerate() {
            let start = if realized.is_inbound() {
                terminal.clone()
            } else {
                terminal.reveal_order(realized.containers())
            };
            values.push(self.decision_value(t, perm, &realized, 0, &start)?);
        }

        let value = Expectation::mean(values);
        trace!(t, %value, "chance node solved");
        self.chance.insert(key, value.clone());
        Ok(value)
    }

    fn decision_value(
        &mut self,
        t: usize,
        perm: usize,
        batch: &RealizedBatch,
        k: usize,
        terminal: &Terminal,
    ) -> Result<Expectation, SolveError> {
        if k == batch.len() {
            return self.chance_value(t + 1, terminal);
        }
        let key = (t, perm, k, terminal.abstract_key());
        if let Some(value) = self.decisions.get(&key) {
            return Ok(value.clone());
        }

        let value = if t + 1 == self.events.len() && !batch.is_inbound() {
            self.finish_last_batch(batch, k, terminal)?
        } else {
            self.expand(t, perm, batch, k, terminal)?
        };
        self.decisions.insert(key, value.clone());
        Ok(value)
    }

    fn expand(
        &mut self,
        t: usize,
        perm: usize,
        batch: &RealizedBatch,
        k: usize,
        terminal: &Terminal,
    ) -> Result<Expectation, SolveError> {
        let container = batch.containers()[k];
        let (children, relocated) = if batch.is_inbound() {
            let children = store_outcomes(terminal, container, None, &self.scope, &mut self.rng)?;
            (children, false)
        } else {
            handle_outbound_container(terminal, container, &self.scope, &mut self.rng)?
        };
        let next_k = if relocated { k } else { k + 1 };

        let mut ranked: Vec<(BigRational, Terminal)> = children
            .into_iter()
            .map(|child| (self.lower_bound(&child), child))
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let mut best = Expectation::Infinite;
        for (bound, child) in ranked {
            if best.finite().is_some_and(|b| bound >= *b) {
                break;
            }
            let value = self.decision_value(t, perm, batch, next_k, &child)?;
            best = best.min(value);
        }
        Ok(if relocated { best + Relocations::ONE } else { best })
    }

    /// Nothing follows the last batch and its order is known, so the rest
    /// of it is a plain shortest path: cheapest first, furthest first on
    /// ties.
    fn finish_last_batch(
        &mut self,
        batch: &RealizedBatch,
        k: usize,
        terminal: &Terminal,
    ) -> Result<Expectation, SolveError> {
        let end = self.events.len();
        let mut seq = 0u64;
        let mut queue = BinaryHeap::new();
        queue.push(Reverse((Relocations::new(0), Reverse(k), seq, terminal.clone())));
        let mut visited: HashSet<(usize, AbstractTerminal)> = HashSet::new();

        while let Some(Reverse((cost, Reverse(i), _, current))) = queue.pop() {
            if i == batch.len() {
                self.chance
                    .entry((end, current.abstract_key()))
                    .or_insert_with(Expectation::zero);
                return Ok(Expectation::from(cost));
            }
            if !visited.insert((i, current.abstract_key())) {
                continue;
            }
            let (children, relocated) = handle_outbound_container(
                &current,
                batch.containers()[i],
                &self.scope,
                &mut self.rng,
            )?;
            let (next_i, next_cost) = if relocated {
                (i, cost.increment())
            } else {
                (i + 1, cost)
            };
            for child in children {
                seq += 1;
                queue.push(Reverse((next_cost, Reverse(next_i), seq, child)));
            }
        }
        Ok(Expectation::Infinite)
    }

    fn choose(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        let outcomes = unique_outcomes(terminal, batch, &self.scope, &mut self.rng)?;
        let last = t + 1 >= self.events.len();

        let mut best: Option<(Expectation, Outcome)> = None;
        for outcome in outcomes {
            let future = if last {
                Expectation::zero()
            } else {
                match self.chance.get(&(t + 1, outcome.terminal().abstract_key())) {
                    Some(v) => v.clone(),
                    None => continue,
                }
            };
            let value = future + outcome.cost();
            if best.as_ref().is_none_or(|(v, _)| value < *v) {
                best = Some((value, outcome));
            }
        }

        match best {
            Some((value, outcome)) if value.is_finite() => {
                debug!(t, %value, cost = outcome.cost().value(), "chose outcome");
                Ok(outcome)
            }
            _ => Err(NoSolutionError::new().with_batch(t).into()),
        }
    }
}

impl Policy for Pbfs {
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        self.choose(terminal, batch, t)
    }

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        self.choose(terminal, batch, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::run_episode;
    use rand::Rng;
    use yard_core::container::{Container, ContainerId};
    use yard_model::{
        block::{Access, Block, Designation},
        stack::Stack,
    };

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    fn ratio(n: i64, d: i64) -> Expectation {
        Expectation::Finite(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    /// Full expectimax without bounds or memoization.
    fn brute_chance<R: Rng>(events: &Events, t: usize, terminal: &Terminal, rng: &mut R) -> Expectation {
        let Some(batch) = events.batch(t) else {
            return Expectation::zero();
        };
        let values: Vec<Expectation> = batch
            .permutations()
            .into_iter()
            .map(|realized| {
                let start = if realized.is_inbound() {
                    terminal.clone()
                } else {
                    terminal.reveal_order(realized.containers())
                };
                brute_decision(events, t, &realized, 0, &start, rng)
            })
            .collect();
        Expectation::mean(values)
    }

    fn brute_decision<R: Rng>(
        events: &Events,
        t: usize,
        batch: &RealizedBatch,
        k: usize,
        terminal: &Terminal,
        rng: &mut R,
    ) -> Expectation {
        if k == batch.len() {
            return brute_chance(events, t + 1, terminal, rng);
        }
        let scope = PlacementScope::unrestricted();
        let container = batch.containers()[k];
        let (children, relocated) = if batch.is_inbound() {
            (store_outcomes(terminal, container, None, &scope, rng).unwrap(), false)
        } else {
            handle_outbound_container(terminal, container, &scope, rng).unwrap()
        };
        let next_k = if relocated { k } else { k + 1 };
        let best = children
            .iter()
            .map(|child| brute_decision(events, t, batch, next_k, child, rng))
            .min()
            .unwrap_or(Expectation::Infinite);
        if relocated { best + Relocations::ONE } else { best }
    }

    fn assert_matches_brute_force(events: Events, initial: Terminal) {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let exact = brute_chance(&events, 0, &initial, &mut rng);
        let pbfs = Pbfs::new(events, &initial).unwrap();
        assert_eq!(pbfs.expected_relocations(), &exact);
    }

    #[test]
    fn test_three_containers_two_stacks() {
        // Two of the three share a stack; see which order is unlucky.
        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[1, 2, 3]]).unwrap();
        let pbfs = Pbfs::new(events, &Terminal::empty_single_stack_blocks(2, 2)).unwrap();
        assert_eq!(pbfs.expected_relocations(), &ratio(2, 3));
    }

    #[test]
    fn test_matches_brute_force_on_single_stack_blocks() {
        let events = Events::from_ids(&[&[1u64, 2][..], &[], &[3], &[2, 3]]).unwrap();
        assert_matches_brute_force(events, Terminal::empty_single_stack_blocks(2, 4));

        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[1], &[4], &[2, 3, 4]]).unwrap();
        assert_matches_brute_force(events, Terminal::empty_single_stack_blocks(2, 3));
    }

    #[test]
    fn test_matches_brute_force_on_a_bay() {
        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[1], &[4], &[2, 3, 4]]).unwrap();
        assert_matches_brute_force(events, Terminal::empty_bays(1, 2));
    }

    #[test]
    fn test_unsolvable_instance_is_rejected() {
        let events = Events::from_ids(&[&[1u64, 2][..], &[1, 2]]).unwrap();
        let err = Pbfs::new(events, &Terminal::empty_single_stack_blocks(1, 2)).unwrap_err();
        assert!(err.is_no_solution());
    }

    #[test]
    fn test_lower_bound() {
        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[1, 2]]).unwrap();
        let pbfs = Pbfs::new(events, &Terminal::empty_single_stack_blocks(3, 3)).unwrap();
        let yard = |stack: Vec<Container>| {
            Terminal::new(
                vec![Block::new(vec![Stack::new(stack)], Access::OneWay, Designation::UNRESTRICTED)],
                3,
            )
        };
        // Label 0 leaves within the horizon, label 1 never does.
        assert_eq!(pbfs.lower_bound(&yard(vec![c(1, 0), c(3, 1)])), BigRational::one());
        assert_eq!(pbfs.lower_bound(&yard(vec![c(3, 1), c(1, 0)])), BigRational::zero());
        assert_eq!(
            pbfs.lower_bound(&yard(vec![c(1, 0), c(2, 0)])),
            BigRational::new(BigInt::from(1), BigInt::from(2))
        );
        assert_eq!(pbfs.lower_bound(&yard(vec![c(3, 1), c(4, 1)])), BigRational::zero());
    }

    #[test]
    fn test_policy_picks_the_cheaper_order() {
        let (c1, c2, c3) = (c(1, 2), c(2, 1), c(3, 1));
        let events = Events::from_ids(&[&[1u64, 2][..], &[], &[3], &[2, 3]]).unwrap();
        let mut pbfs = Pbfs::new(events, &Terminal::empty_single_stack_blocks(2, 4)).unwrap();
        let single = |s: Vec<Container>| {
            Block::new(vec![Stack::new(s)], Access::OneWay, Designation::UNRESTRICTED)
        };
        let yard = Terminal::new(vec![single(vec![c1]), single(vec![c2, c3])], 4);
        let done = Terminal::new(vec![single(vec![c1]), single(vec![])], 4);

        let out = pbfs
            .handle(&yard, &RealizedBatch::outbound(vec![c2, c3]), 3)
            .unwrap();
        assert_eq!(out.cost(), Relocations::new(1));
        assert_eq!(out.terminal(), &done);

        let out = pbfs
            .handle(&yard, &RealizedBatch::outbound(vec![c3, c2]), 3)
            .unwrap();
        assert_eq!(out.cost(), Relocations::new(0));
        assert_eq!(out.terminal(), &done);
    }

    #[test]
    fn test_policy_reaches_the_expected_value() {
        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[1, 2, 3]]).unwrap();
        let initial = Terminal::empty_single_stack_blocks(2, 2);
        let mut pbfs = Pbfs::new(events.clone(), &initial).unwrap();
        let mut total = Relocations::new(0);
        let mut runs = 0u64;
        for realization in events.batches()[1].permutations() {
            let inbound = RealizedBatch::inbound(events.batches()[0].containers().to_vec());
            let episode = yard_model::events::RealizedEvents::new(vec![inbound, realization]);
            total += run_episode(&mut pbfs, &initial, &episode).unwrap();
            runs += 1;
        }
        assert_eq!(Expectation::from(total) / runs, ratio(2, 3));
    }
}
