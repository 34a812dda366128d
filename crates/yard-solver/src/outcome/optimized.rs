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

use super::{inconsistent, locate, take, Outcome, PlacementScope};
use crate::{
    err::{NoSolutionError, SolveError},
    vfa::ValueFunction,
};
use rand::Rng;
use yard_core::{batch::RealizedBatch, container::Container, cost::Relocations};
use yard_model::{
    location::Location,
    placement::{corridor, valid_store_locations},
    terminal::Terminal,
};

/// Inputs for scoring single placements with a value function.
pub struct Scoring<'a, V: ?Sized> {
    pub vfa: &'a V,
    pub iteration: usize,
    pub t: usize,
    /// Half-width of the corridor features are evaluated on, around the
    /// block a candidate lands in. `None` evaluates the whole yard.
    pub feature_corridor_size: Option<usize>,
    /// Pick uniformly among legal spots instead of the best scored one.
    pub explore: bool,
}

/// Handles a batch one container at a time, putting every container on the
/// spot the value function likes best.
///
/// Trades the completeness of `unique_outcomes` for a number of candidate
/// evaluations linear in the batch. Returns the outcome and the value
/// function's estimate of it at `t + 1`.
pub fn optimized_outcome<V, R>(
    terminal: &Terminal,
    batch: &RealizedBatch,
    scope: &PlacementScope,
    scoring: &Scoring<'_, V>,
    rng: &mut R,
) -> Result<(Outcome, f64), SolveError>
where
    V: ValueFunction + ?Sized,
    R: Rng + ?Sized,
{
    let mut current = if batch.is_inbound() {
        terminal.clone()
    } else {
        terminal.reveal_order(batch.containers())
    };
    let mut cost = Relocations::new(0);

    for &container in batch.containers() {
        if batch.is_inbound() {
            current = place(&current, container, None, scope, scoring, rng)?;
            continue;
        }

        let location = locate(&current, container.id(), terminal)?;
        let blocking = current.blocking_containers(location);
        cost += Relocations::from(blocking.len());
        for blocker in blocking {
            let from = locate(&current, blocker.id(), terminal)?.stack_location();
            let (after, moved) = take(&current, from, blocker.id(), terminal)?;
            current = place(&after, moved, Some(location), scope, scoring, rng)?;
        }
        current = take(&current, location.stack_location(), container.id(), terminal)?.0;
    }

    let estimate = scoring
        .vfa
        .estimate(scoring.iteration, scoring.t + 1, &current, None);
    Ok((Outcome::new(current, cost), estimate))
}

fn place<V, R>(
    terminal: &Terminal,
    container: Container,
    target: Option<Location>,
    scope: &PlacementScope,
    scoring: &Scoring<'_, V>,
    rng: &mut R,
) -> Result<Terminal, SolveError>
where
    V: ValueFunction + ?Sized,
    R: Rng + ?Sized,
{
    let designation = scope.designation(container.id());
    let blocks = corridor(
        terminal,
        target.map(|t| t.block()),
        scope.corridor_size(),
        designation,
        rng,
    );
    let candidates = valid_store_locations(terminal, &blocks, target, designation);
    if candidates.is_empty() {
        return Err(NoSolutionError::new().with_container(container.id()).into());
    }

    if scoring.explore {
        let pick = candidates[rng.random_range(0..candidates.len())];
        return terminal
            .store(pick, container)
            .map_err(|e| inconsistent(e, terminal, terminal));
    }

    let mut best: Option<(f64, Terminal)> = None;
    for candidate in candidates {
        let next = terminal
            .store(candidate, container)
            .map_err(|e| inconsistent(e, terminal, terminal))?;
        let window = scoring.feature_corridor_size.map(|size| {
            corridor(&next, Some(candidate.block()), Some(size), designation, rng)
        });
        let value = scoring
            .vfa
            .estimate(scoring.iteration, scoring.t + 1, &next, window.as_deref());
        if best.as_ref().is_none_or(|(v, _)| value < *v) {
            best = Some((value, next));
        }
    }
    best.map(|(_, t)| t)
        .ok_or_else(|| NoSolutionError::new().with_container(container.id()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use yard_core::container::{ContainerId, Label};
    use yard_model::location::StackLocation;

    fn c(id: u64, label: u32) -> Container {
        Container::new(ContainerId::new(id), Label::new(label))
    }

    /// Prefers terminals whose first block holds many containers.
    struct FirstBlockLover;

    impl ValueFunction for FirstBlockLover {
        fn estimate(&self, _: usize, _: usize, terminal: &Terminal, _: Option<&[usize]>) -> f64 {
            let first = terminal.block(0).map_or(0, |b| {
                b.stacks().iter().map(|s| s.height()).sum::<usize>()
            });
            -(first as f64)
        }

        fn ingest_sample(&mut self, _: usize, _: usize, _: &Terminal, _: Option<&Terminal>, _: f64) {}

        fn on_iteration_complete(&mut self, _: usize) {}
    }

    fn scoring(explore: bool) -> Scoring<'static, FirstBlockLover> {
        Scoring {
            vfa: &FirstBlockLover,
            iteration: 1,
            t: 0,
            feature_corridor_size: None,
            explore,
        }
    }

    #[test]
    fn test_optimized_inbound_follows_value_function() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let t = Terminal::empty_single_stack_blocks(3, 3);
        let batch = RealizedBatch::inbound(vec![c(1, 1), c(2, 2)]);
        let (outcome, value) =
            optimized_outcome(&t, &batch, &PlacementScope::unrestricted(), &scoring(false), &mut rng)
                .unwrap();
        assert_eq!(outcome.cost(), Relocations::new(0));
        assert_eq!(outcome.terminal().stack_height(StackLocation::new(0, 0)), 2);
        assert_eq!(value, -2.0);
    }

    #[test]
    fn test_optimized_outbound_counts_blockers() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let t = Terminal::empty_single_stack_blocks(3, 3)
            .store(StackLocation::new(1, 0), c(1, 1))
            .and_then(|t| t.store(StackLocation::new(1, 0), c(2, 2)))
            .and_then(|t| t.store(StackLocation::new(1, 0), c(3, 3)))
            .unwrap();
        let batch = RealizedBatch::outbound(vec![c(1, 1)]);
        for explore in [false, true] {
            let (outcome, _) = optimized_outcome(
                &t,
                &batch,
                &PlacementScope::unrestricted(),
                &scoring(explore),
                &mut rng,
            )
            .unwrap();
            assert_eq!(outcome.cost(), Relocations::new(2));
            assert_eq!(outcome.terminal().num_containers(), 2);
            assert!(outcome.terminal().container_location(ContainerId::new(1)).is_err());
            if !explore {
                assert_eq!(outcome.terminal().stack_height(StackLocation::new(0, 0)), 2);
            }
        }
    }

    #[test]
    fn test_optimized_fails_without_room() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let t = Terminal::empty_single_stack_blocks(1, 2)
            .store(StackLocation::new(0, 0), c(1, 1))
            .and_then(|t| t.store(StackLocation::new(0, 0), c(2, 2)))
            .unwrap();
        let batch = RealizedBatch::outbound(vec![c(1, 1)]);
        let err =
            optimized_outcome(&t, &batch, &PlacementScope::unrestricted(), &scoring(false), &mut rng);
        assert!(matches!(err, Err(SolveError::NoSolution(_))));
    }
}
