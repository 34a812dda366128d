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

use crate::{
    err::SolveError,
    outcome::{myopic::lowest_outcome, Outcome, PlacementScope},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statrs::statistics::Statistics;
use tracing::{debug, info, instrument};
use yard_core::{batch::RealizedBatch, cost::Relocations};
use yard_model::{
    events::{EventSource, RealizedEvents},
    terminal::Terminal,
};

/// Decides how the yard handles one realized batch.
///
/// Implementations get the index `t` of the batch within its episode.
/// `handle` reveals the order of outbound batches on the terminal before
/// passing it on.
pub trait Policy {
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError>;

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError>;

    fn handle(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        if batch.is_inbound() {
            self.handle_inbound(terminal, batch, t)
        } else {
            let revealed = terminal.reveal_order(batch.containers());
            self.handle_outbound(&revealed, batch, t)
        }
    }
}

impl<P: Policy + ?Sized> Policy for &mut P {
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        (**self).handle_inbound(terminal, batch, t)
    }

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        t: usize,
    ) -> Result<Outcome, SolveError> {
        (**self).handle_outbound(terminal, batch, t)
    }
}

/// Takes the cheapest way through every batch, blind to the future.
#[derive(Debug, Clone)]
pub struct MyopicPolicy {
    scope: PlacementScope,
    rng: ChaCha8Rng,
}

impl MyopicPolicy {
    pub fn new(scope: PlacementScope, seed: u64) -> Self {
        Self {
            scope,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for MyopicPolicy {
    fn default() -> Self {
        Self::new(PlacementScope::unrestricted(), 0)
    }
}

impl Policy for MyopicPolicy {
    fn handle_inbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        _t: usize,
    ) -> Result<Outcome, SolveError> {
        lowest_outcome(terminal, batch, &self.scope, &mut self.rng)
    }

    fn handle_outbound(
        &mut self,
        terminal: &Terminal,
        batch: &RealizedBatch,
        _t: usize,
    ) -> Result<Outcome, SolveError> {
        lowest_outcome(terminal, batch, &self.scope, &mut self.rng)
    }
}

/// Plays one realized episode and returns the total relocations, the sum
/// of what every batch reported.
pub fn run_episode<P: Policy + ?Sized>(
    policy: &mut P,
    initial: &Terminal,
    episode: &RealizedEvents,
) -> Result<Relocations, SolveError> {
    let mut terminal = initial.clone();
    let mut total = Relocations::new(0);
    for (t, batch) in episode.batches().iter().enumerate() {
        let (next, cost) = policy
            .handle(&terminal, batch, t)
            .map_err(|e| e.at_batch(t))?
            .into_parts();
        total += cost;
        terminal = next;
    }
    Ok(total)
}

/// Monte-Carlo estimate of a policy: mean and sample standard deviation of
/// the total relocations over `samples` evaluation episodes. The source is
/// reset first so every policy sees the same episodes.
#[instrument(skip_all, fields(samples), err(Display))]
pub fn evaluate_policy<P, S>(
    policy: &mut P,
    initial: &Terminal,
    source: &mut S,
    samples: usize,
) -> Result<(f64, f64), SolveError>
where
    P: Policy + ?Sized,
    S: EventSource + ?Sized,
{
    source.reset();
    let mut results = Vec::with_capacity(samples);
    for i in 0..samples {
        let episode = source.sample_evaluating()?;
        let cost = run_episode(policy, initial, &episode)?;
        debug!(sample = i, relocations = cost.value(), "evaluated episode");
        results.push(cost.as_f64());
    }
    let mean = results.iter().mean();
    let std_dev = results.iter().std_dev();
    info!(mean, std_dev, "policy evaluated");
    Ok((mean, std_dev))
}
