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

//! Rule based policies.
//!
//! A [`HeuristicPolicy`] handles inbound containers one by one and clears
//! the blockers of every outbound container before taking it, asking its
//! [`PlacementRule`] where each container goes. It can also compute its own
//! expected number of relocations exactly by enumerating every realization
//! of the planned events.

pub mod mm;

pub use mm::{MmRule, MmVariant};

use crate::{
    err::SolveError,
    expectation::Expectation,
    outcome::{locate, take, Outcome},
    policy::Policy,
};
use std::collections::HashMap;
use tracing::{debug, instrument};
use yard_core::{batch::RealizedBatch, container::Container, cost::Relocations};
use yard_model::{
    block::Designation,
    events::Events,
    location::Location,
    placement::Designations,
    terminal::Terminal,
};

/// Where a single container goes.
pub trait PlacementRule {
    /// Stores `container` in `terminal`. A `target` is the container about to
    /// be retrieved; its stack and diagonal are off limits.
    fn place(
        &self,
        terminal: &Terminal,
        container: Container,
        target: Option<Location>,
        designation: Designation,
    ) -> Result<Terminal, SolveError>;
}

/// A policy driven entirely by a placement rule.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy<P> {
    rule: P,
    events: Events,
    designations: Designations,
    cache: HashMap<(usize, Terminal), Expectation>,
}

pub type MmPolicy = HeuristicPolicy<MmRule>;

impl MmPolicy {
    pub fn mm(variant: MmVariant, events: Events, designations: Designations) -> Self {
        HeuristicPolicy::new(MmRule::new(variant), events, designations)
    }
}

impl<P: PlacementRule> HeuristicPolicy<P> {
    pub fn new(rule: P, events: Events, designations: Designations) -> Self {
        Self {
            rule,
            events,
            designations,
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn rule(&self) -> &P {
        &self.rule
    }

    #[inline]
    pub fn events(&self) -> &Events {
        &self.events
    }

    fn place_inbound(&self, terminal: &Terminal, batch: &RealizedBatch) -> Result<Outcome, SolveError> {
        let mut current = terminal.clone();
        for &container in batch.containers() {
            let designation = self.designations.get(container.id());
            current = self.rule.place(&current, container, None, designation)?;
        }
        Ok(Outcome::new(current, Relocations::new(0)))
    }

    fn retrieve_outbound(
        &self,
        terminal: &Terminal,
        batch: &RealizedBatch,
    ) -> Result<Outcome, SolveError> {
        let mut current = terminal.clone();
        let mut cost = Relocations::new(0);
        for target in batch.containers() {
            let location = locate(&current, target.id(), terminal)?;
            let blocking = current.blocking_containers(location);
            cost += Relocations::from(blocking.len());
            for blocker in blocking {
                let from = locate(&current, blocker.id(), terminal)?.stack_location();
                let (after, moved) = take(&current, from, blocker.id(), terminal)?;
                let designation = self.designations.get(moved.id());
                current = self.rule.place(&after, moved, Some(location), designation)?;
            }
            current = take(&current, location.stack_location(), target.id(), terminal)?.0;
        }
        Ok(Outcome::new(current, cost))
    }

    /// Expected relocations of this policy over all equally likely
    /// realizations of the planned events, starting from `initial`.
    ///
    /// Realizations in which the rule finds no legal spot make the result
    /// infinite; any other error is returned.
    #[instrument(skip_all, fields(batches = self.events.len()), err(Display))]
    pub fn expected_relocations(&mut self, initial: &Terminal) -> Result<Expectation, SolveError> {
        let value = self.expected_from(initial, 0)?;
        debug!(%value, cached = self.cache.len(), "expected relocations computed");
        Ok(value)
    }

    fn expected_from(&mut self, terminal: &Terminal, t: usize) -> Result<Expectation, SolveError> {
        let Some(batch) = self.events.batch(t).cloned() else {
            return Ok(Expectation::zero());
        };
        let key = (t, terminal.clone());
        if let Some(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }

        let mut values = Vec::new();
        for realization in batch.permutations() {
            let step = match self.handle(terminal, &realization, t) {
                Ok(outcome) => outcome,
                Err(e) if e.is_no_solution() => {
                    values.push(Expectation::Infinite);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let (next, cost) = step.into_parts();
            values.push(self.expected_from(&next, t + 1)? + cost);
        }

        let value = Expectation::mean(values);
        self.cache.insert(key, value.clone());
        Ok(value)
    }
}

impl<P: PlacementRule> Policy for HeuristicPolicy<P> {
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        _t: usize,
    ) -> Result<Outcome, SolveError> {
        self.place_inbound(terminal, batch)
    }

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        _t: usize,
    ) -> Result<Outcome, SolveError> {
        self.retrieve_outbound(terminal, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use yard_core::{
        batch::{Batch, Direction},
        container::{ContainerId, Label},
    };
    use yard_model::location::StackLocation;

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    fn ratio(n: i64, d: i64) -> Expectation {
        Expectation::Finite(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    #[test]
    fn test_outbound_counts_and_moves_blockers() {
        let t = Terminal::empty_single_stack_blocks(2, 3)
            .store(StackLocation::new(0, 0), c(1, 0))
            .and_then(|t| t.store(StackLocation::new(0, 0), c(2, 1)))
            .unwrap();
        let mut policy = MmPolicy::mm(MmVariant::Standard, Events::new(vec![]), Designations::new());
        let out = policy
            .handle_outbound(&t, &RealizedBatch::outbound(vec![c(1, 0)]), 1)
            .unwrap();
        assert_eq!(out.cost(), Relocations::new(1));
        assert_eq!(out.terminal().num_containers(), 1);
        assert_eq!(
            out.terminal().container_location(ContainerId::new(2)).unwrap(),
            Location::new(1, 0, 0)
        );
    }

    #[test]
    fn test_inbound_is_free() {
        let t = Terminal::empty_single_stack_blocks(2, 2);
        let mut policy = MmPolicy::mm(MmVariant::Adopted, Events::new(vec![]), Designations::new());
        let out = policy
            .handle_inbound(&t, &RealizedBatch::inbound(vec![c(1, 0), c(2, 0)]), 0)
            .unwrap();
        assert_eq!(out.cost(), Relocations::new(0));
        assert_eq!(out.terminal().num_containers(), 2);
    }

    #[test]
    fn test_expected_relocations_averages_outbound_orders() {
        // 2 sits on 1; it only has to move when 1 is called first.
        let events = Events::new(vec![Batch::new(
            Direction::Outbound,
            vec![c(1, 0), c(2, 0)],
        )]);
        let initial = Terminal::empty_single_stack_blocks(2, 2)
            .store(StackLocation::new(0, 0), c(1, 0))
            .and_then(|t| t.store(StackLocation::new(0, 0), c(2, 0)))
            .unwrap();
        let mut policy = MmPolicy::mm(MmVariant::Standard, events, Designations::new());
        assert_eq!(policy.expected_relocations(&initial).unwrap(), ratio(1, 2));
    }

    #[test]
    fn test_expected_relocations_zero_with_room() {
        let events = Events::from_ids(&[&[1u64, 2][..], &[1], &[], &[2]]).unwrap();
        let mut policy = MmPolicy::mm(MmVariant::Standard, events, Designations::new());
        let value = policy
            .expected_relocations(&Terminal::empty_single_stack_blocks(2, 2))
            .unwrap();
        assert_eq!(value, Expectation::zero());
    }

    #[test]
    fn test_expected_relocations_infinite_without_room() {
        let events = Events::from_ids(&[&[1u64, 2][..]]).unwrap();
        let mut policy = MmPolicy::mm(MmVariant::Standard, events, Designations::new());
        let value = policy
            .expected_relocations(&Terminal::empty_single_stack_blocks(1, 1))
            .unwrap();
        assert_eq!(value, Expectation::Infinite);
    }
}
