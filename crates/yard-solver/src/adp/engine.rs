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

use super::config::{AdpConfig, UpdateMode};
use crate::{
    err::{NoSolutionError, SolveError},
    outcome::{
        optimized::{optimized_outcome, Scoring},
        unique_outcomes, Outcome, PlacementScope,
    },
    policy::{run_episode, Policy},
    vfa::ValueFunction,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::statistics::Statistics;
use tracing::{debug, info, instrument, warn};
use yard_core::{batch::RealizedBatch, cost::Relocations};
use yard_model::{events::EventSource, placement::Designations, terminal::Terminal};

/// What a state from which the episode could not be finished is worth.
pub const NO_SOLUTION_PENALTY: f64 = 1e19;

/// Result of evaluating the greedy policy after one training iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationRecord {
    iteration: usize,
    mean: f64,
    std_dev: f64,
    initial_value: f64,
}

impl EvaluationRecord {
    #[inline]
    pub fn new(iteration: usize, mean: f64, std_dev: f64, initial_value: f64) -> Self {
        Self {
            iteration,
            mean,
            std_dev,
            initial_value,
        }
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Mean relocations over the evaluation episodes.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// The value function's estimate of the initial yard at that point.
    #[inline]
    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }
}

/// One decision: where the batch leaves the yard and what it was valued at.
struct Decision {
    outcome: Outcome,
    value: f64,
}

/// Approximate dynamic programming over sampled episodes.
///
/// Each iteration plays one training episode epsilon-greedily against the
/// current value function and feeds what it observed back into it. Once
/// trained (or while training, between iterations) the engine acts as a
/// greedy [`Policy`].
#[derive(Debug, Clone)]
pub struct AdpEngine<V, S> {
    config: AdpConfig,
    vfa: V,
    source: S,
    initial: Terminal,
    scope: PlacementScope,
    rng: ChaCha8Rng,
    iteration: usize,
    evaluations: Vec<EvaluationRecord>,
}

impl<V, S> AdpEngine<V, S>
where
    V: ValueFunction,
    S: EventSource,
{
    pub fn new(
        config: AdpConfig,
        vfa: V,
        source: S,
        initial: Terminal,
        designations: Designations,
    ) -> Self {
        let scope = PlacementScope::new(config.placement.corridor_size, designations);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            vfa,
            source,
            initial,
            scope,
            rng,
            iteration: 1,
            evaluations: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &AdpConfig {
        &self.config
    }

    #[inline]
    pub fn value_function(&self) -> &V {
        &self.vfa
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    #[inline]
    pub fn initial(&self) -> &Terminal {
        &self.initial
    }

    /// The iteration whose value function the policy acts on.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[inline]
    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    /// Current estimate of the relocations from the initial yard.
    pub fn initial_value(&self) -> f64 {
        self.vfa.estimate(self.iteration, 0, &self.initial, None)
    }

    /// Runs every training iteration, evaluating on schedule. The records
    /// are available from [`AdpEngine::evaluations`] afterwards.
    ///
    /// Episodes without a solution are part of learning and do not fail the
    /// run; an inconsistent yard or an exhausted event source does.
    #[instrument(
        skip_all,
        fields(iterations = self.config.iterations, mode = %self.config.update_mode),
        err(Display)
    )]
    pub fn train(&mut self) -> Result<(), SolveError> {
        self.source.reset();
        let iterations = self.config.iterations;
        for n in 1..=iterations {
            self.iteration = n;
            match self.config.update_mode {
                UpdateMode::SinglePass => self.single_pass(n)?,
                UpdateMode::DoublePass => self.double_pass(n)?,
            }
            self.vfa.on_iteration_complete(n);
            debug!(iteration = n, of = iterations, "iteration complete");

            if self.config.evaluation.due(n, iterations) {
                self.evaluate_iteration(n)?;
            }
        }
        self.iteration = iterations + 1;
        info!(initial_value = self.initial_value(), "training finished");
        Ok(())
    }

    fn single_pass(&mut self, n: usize) -> Result<(), SolveError> {
        let episode = self.source.sample()?;
        let mut current = self.initial.clone();
        for (t, batch) in episode.batches().iter().enumerate() {
            match self.epsilon_greedy(n, &current, batch, t) {
                Ok(decision) => {
                    let (next, _) = decision.outcome.into_parts();
                    self.vfa
                        .ingest_sample(n, t, &current, Some(&next), decision.value);
                    current = next;
                }
                Err(e) if e.is_no_solution() => {
                    debug!(iteration = n, t, "training episode has no solution");
                    self.vfa
                        .ingest_sample(n, t, &current, None, NO_SOLUTION_PENALTY);
                    return Ok(());
                }
                Err(e) => return Err(e.at_batch(t)),
            }
        }
        Ok(())
    }

    fn double_pass(&mut self, n: usize) -> Result<(), SolveError> {
        let episode = self.source.sample()?;
        let mut current = self.initial.clone();
        let mut trace: Vec<(Terminal, Terminal, Relocations)> = Vec::with_capacity(episode.len());
        let mut failed = false;
        for (t, batch) in episode.batches().iter().enumerate() {
            match self.epsilon_greedy(n, &current, batch, t) {
                Ok(decision) => {
                    let (next, cost) = decision.outcome.into_parts();
                    trace.push((current, next.clone(), cost));
                    current = next;
                }
                Err(e) if e.is_no_solution() => {
                    debug!(iteration = n, t, "training episode has no solution");
                    failed = true;
                    break;
                }
                Err(e) => return Err(e.at_batch(t)),
            }
        }

        let discount = self.config.discount;
        let mut future = if failed { NO_SOLUTION_PENALTY } else { 0.0 };
        for (t, (previous, next, cost)) in trace.iter().enumerate().rev() {
            let mut value = cost.as_f64() + discount * future;
            if failed {
                value = value.min(NO_SOLUTION_PENALTY);
            }
            self.vfa.ingest_sample(n, t, previous, Some(next), value);
            future = value;
        }
        Ok(())
    }

    fn epsilon_greedy(
        &mut self,
        n: usize,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Decision, SolveError> {
        let explore = self.rng.random::<f64>() < self.config.epsilon;
        self.decide(n, terminal, batch, t, explore)
    }

    fn decide(
        &mut self,
        n: usize,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
        explore: bool,
    ) -> Result<Decision, SolveError> {
        let discount = self.config.discount;
        if self.config.placement.optimized_outcomes {
            let scoring = Scoring {
                vfa: &self.vfa,
                iteration: n,
                t,
                feature_corridor_size: self.config.placement.feature_corridor_size,
                explore,
            };
            let (outcome, estimate) =
                optimized_outcome(terminal, batch, &self.scope, &scoring, &mut self.rng)?;
            let value = outcome.cost().as_f64() + discount * estimate;
            return Ok(Decision { outcome, value });
        }

        let mut outcomes = unique_outcomes(terminal, batch, &self.scope, &mut self.rng)?;
        let value_of = |o: &Outcome| {
            o.cost().as_f64() + discount * self.vfa.estimate(n, t + 1, o.terminal(), None)
        };

        if explore {
            let pick = self.rng.random_range(0..outcomes.len());
            let outcome = outcomes.swap_remove(pick);
            let value = value_of(&outcome);
            return Ok(Decision { outcome, value });
        }

        let mut best: Option<(f64, usize)> = None;
        for (i, outcome) in outcomes.iter().enumerate() {
            let value = value_of(outcome);
            if best.is_none_or(|(v, _)| value < v) {
                best = Some((value, i));
            }
        }
        match best {
            Some((value, i)) => Ok(Decision {
                outcome: outcomes.swap_remove(i),
                value,
            }),
            None => Err(NoSolutionError::new().with_batch(t).into()),
        }
    }

    /// Plays every evaluation episode greedily with the value function of
    /// iteration `n`. Episodes without a solution count as the penalty.
    #[instrument(skip(self), fields(samples = self.config.evaluation.samples), err(Display))]
    pub fn evaluate_iteration(&mut self, n: usize) -> Result<EvaluationRecord, SolveError> {
        self.source.reset_evaluating();
        let initial = self.initial.clone();
        let mut results = Vec::with_capacity(self.config.evaluation.samples);
        for _ in 0..self.config.evaluation.samples {
            let episode = self.source.sample_evaluating()?;
            let cost = match run_episode(self, &initial, &episode) {
                Ok(cost) => cost.as_f64(),
                Err(e) if e.is_no_solution() => {
                    debug!(%e, "evaluation episode has no solution");
                    NO_SOLUTION_PENALTY
                }
                Err(e) => return Err(e),
            };
            results.push(cost);
        }
        if results.iter().any(|&r| r >= NO_SOLUTION_PENALTY) {
            warn!(iteration = n, "evaluation hit episodes without a solution");
        }

        let record = EvaluationRecord::new(
            n,
            results.iter().mean(),
            results.iter().std_dev(),
            self.vfa.estimate(n, 0, &initial, None),
        );
        info!(
            iteration = n,
            mean = record.mean(),
            std_dev = record.std_dev(),
            initial_value = record.initial_value(),
            "evaluation"
        );
        self.evaluations.push(record);
        Ok(record)
    }

    fn act(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        let n = self.iteration;
        self.decide(n, terminal, batch, t, false).map(|d| d.outcome)
    }
}

impl<V, S> Policy for AdpEngine<V, S>
where
    V: ValueFunction,
    S: EventSource,
{
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        self.act(terminal, batch, t)
    }

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        self.act(terminal, batch, t)
    }
}
