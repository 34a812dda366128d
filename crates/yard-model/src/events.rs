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

use crate::err::{
    ContainerNotFoundError, DuplicateContainerError, EventsBuildError, EventsExhaustedError,
    SampleKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use yard_core::{
    batch::{Batch, Direction, RealizedBatch},
    container::{Container, ContainerId, Label},
};

/// The planned sequence of batches of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Events {
    batches: Vec<Batch>,
}

impl Events {
    #[inline]
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Builds alternating inbound/outbound batches from container ids.
    ///
    /// Batch `2k` brings containers in, batch `2k + 1` takes containers out
    /// and gives them departure label `k`. Containers that never leave get
    /// the label `len / 2`, past every outbound batch.
    pub fn from_ids<B: AsRef<[u64]>>(batches: &[B]) -> Result<Self, EventsBuildError> {
        let mut labels: HashMap<u64, Label> = HashMap::new();
        for (i, batch) in batches.iter().enumerate().skip(1).step_by(2) {
            for &id in batch.as_ref() {
                labels.insert(id, Label::new((i / 2) as u32));
            }
        }
        let default_label = Label::new((batches.len() / 2) as u32);

        let mut arrived: HashMap<u64, Container> = HashMap::new();
        let mut out = Vec::with_capacity(batches.len());
        for (i, batch) in batches.iter().enumerate() {
            let direction = Direction::alternating(i);
            let mut containers = Vec::with_capacity(batch.as_ref().len());
            for &id in batch.as_ref() {
                let container = match direction {
                    Direction::Inbound => {
                        let label = labels.get(&id).copied().unwrap_or(default_label);
                        let container = Container::new(ContainerId::new(id), label);
                        if arrived.insert(id, container).is_some() {
                            return Err(DuplicateContainerError::new(ContainerId::new(id), i).into());
                        }
                        container
                    }
                    Direction::Outbound => *arrived
                        .get(&id)
                        .ok_or(ContainerNotFoundError::new(ContainerId::new(id)))?,
                };
                containers.push(container);
            }
            out.push(Batch::new(direction, containers));
        }
        Ok(Self::new(out))
    }

    #[inline]
    pub fn batch(&self, t: usize) -> Option<&Batch> {
        self.batches.get(t)
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Draws one realization of every batch.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> RealizedEvents {
        RealizedEvents::new(self.batches.iter().map(|b| b.sample(rng)).collect())
    }

    /// Number of distinct realizations of the whole scenario, saturating.
    pub fn max_realizations(&self) -> u128 {
        self.batches
            .iter()
            .fold(1u128, |acc, b| acc.saturating_mul(b.realizations()))
    }

    /// Inbound batches strictly after `t`, with their index.
    pub fn inbound_after(&self, t: usize) -> impl Iterator<Item = (usize, &Batch)> {
        self.batches
            .iter()
            .enumerate()
            .skip(t + 1)
            .filter(|(_, b)| b.is_inbound())
    }
}

/// One concrete realization of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedEvents {
    batches: Vec<RealizedBatch>,
}

impl RealizedEvents {
    #[inline]
    pub fn new(batches: Vec<RealizedBatch>) -> Self {
        Self { batches }
    }

    #[inline]
    pub fn batch(&self, t: usize) -> Option<&RealizedBatch> {
        self.batches.get(t)
    }

    #[inline]
    pub fn batches(&self) -> &[RealizedBatch] {
        &self.batches
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Where training and evaluation episodes come from.
pub trait EventSource {
    fn events(&self) -> &Events;

    fn sample(&mut self) -> Result<RealizedEvents, EventsExhaustedError>;

    fn sample_evaluating(&mut self) -> Result<RealizedEvents, EventsExhaustedError>;

    /// Restarts both sample streams from the beginning.
    fn reset(&mut self);

    fn reset_evaluating(&mut self);
}

/// Draws fresh realizations from two seeded streams, one for training and
/// one for evaluation. Never runs dry.
#[derive(Debug, Clone)]
pub struct SampledEvents {
    events: Events,
    seed: u64,
    training_rng: ChaCha8Rng,
    evaluating_rng: ChaCha8Rng,
}

impl SampledEvents {
    const EVALUATION_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn new(events: Events, seed: u64) -> Self {
        Self {
            events,
            seed,
            training_rng: ChaCha8Rng::seed_from_u64(seed),
            evaluating_rng: ChaCha8Rng::seed_from_u64(seed ^ Self::EVALUATION_STREAM),
        }
    }
}

impl EventSource for SampledEvents {
    fn events(&self) -> &Events {
        &self.events
    }

    fn sample(&mut self) -> Result<RealizedEvents, EventsExhaustedError> {
        Ok(self.events.sample(&mut self.training_rng))
    }

    fn sample_evaluating(&mut self) -> Result<RealizedEvents, EventsExhaustedError> {
        Ok(self.events.sample(&mut self.evaluating_rng))
    }

    fn reset(&mut self) {
        self.training_rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.reset_evaluating();
    }

    fn reset_evaluating(&mut self) {
        self.evaluating_rng = ChaCha8Rng::seed_from_u64(self.seed ^ Self::EVALUATION_STREAM);
    }
}

/// Fixed lists of training and evaluation realizations, handed out in
/// order. Asking for more than were drawn is an error.
#[derive(Debug, Clone)]
pub struct EvaluatableEvents {
    events: Events,
    training: Vec<RealizedEvents>,
    evaluating: Vec<RealizedEvents>,
    next_training: usize,
    next_evaluating: usize,
}

impl EvaluatableEvents {
    pub fn new(
        events: Events,
        training: Vec<RealizedEvents>,
        evaluating: Vec<RealizedEvents>,
    ) -> Self {
        Self {
            events,
            training,
            evaluating,
            next_training: 0,
            next_evaluating: 0,
        }
    }

    /// Draws `samples` training and `samples` evaluation realizations.
    pub fn from_events(events: Events, samples: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let training = (0..samples).map(|_| events.sample(&mut rng)).collect();
        let evaluating = (0..samples).map(|_| events.sample(&mut rng)).collect();
        Self::new(events, training, evaluating)
    }

    #[inline]
    pub fn training(&self) -> &[RealizedEvents] {
        &self.training
    }

    #[inline]
    pub fn evaluating(&self) -> &[RealizedEvents] {
        &self.evaluating
    }
}

impl EventSource for EvaluatableEvents {
    fn events(&self) -> &Events {
        &self.events
    }

    fn sample(&mut self) -> Result<RealizedEvents, EventsExhaustedError> {
        let sample = self
            .training
            .get(self.next_training)
            .cloned()
            .ok_or(EventsExhaustedError::new(SampleKind::Training, self.training.len()))?;
        self.next_training += 1;
        Ok(sample)
    }

    fn sample_evaluating(&mut self) -> Result<RealizedEvents, EventsExhaustedError> {
        let sample = self
            .evaluating
            .get(self.next_evaluating)
            .cloned()
            .ok_or(EventsExhaustedError::new(
                SampleKind::Evaluating,
                self.evaluating.len(),
            ))?;
        self.next_evaluating += 1;
        Ok(sample)
    }

    fn reset(&mut self) {
        self.next_training = 0;
        self.next_evaluating = 0;
    }

    fn reset_evaluating(&mut self) {
        self.next_evaluating = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(batch: &Batch) -> Vec<(u64, u32)> {
        batch
            .containers()
            .iter()
            .map(|c| (c.id().value(), c.label().value()))
            .collect()
    }

    #[test]
    fn test_from_ids_assigns_departure_labels() {
        let events = Events::from_ids(&[&[1u64, 2][..], &[1], &[3, 4, 5], &[2, 3, 4]]).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(labels(&events.batches()[0]), vec![(1, 0), (2, 1)]);
        assert_eq!(labels(&events.batches()[2]), vec![(3, 1), (4, 1), (5, 2)]);
        assert!(!events.batches()[3].is_inbound());
        assert_eq!(labels(&events.batches()[3]), vec![(2, 1), (3, 1), (4, 1)]);
    }

    #[test]
    fn test_from_ids_rejects_duplicates_and_unknown_departures() {
        let dup = Events::from_ids(&[&[1u64][..], &[], &[1]]);
        assert!(matches!(dup, Err(EventsBuildError::DuplicateContainer(_))));
        let unknown = Events::from_ids(&[&[1u64][..], &[2]]);
        assert!(matches!(unknown, Err(EventsBuildError::UnknownContainer(_))));
    }

    #[test]
    fn test_max_realizations_multiplies_factorials() {
        let events = Events::from_ids(&[&[1u64, 2, 3][..], &[], &[4, 5], &[1, 2]]).unwrap();
        assert_eq!(events.max_realizations(), 6 * 2 * 2);
    }

    #[test]
    fn test_evaluatable_events_run_dry_and_reset() {
        let events = Events::from_ids(&[&[1u64, 2][..], &[1, 2]]).unwrap();
        let mut source = EvaluatableEvents::from_events(events, 2, 11);
        let first = source.sample().unwrap();
        source.sample().unwrap();
        assert!(source.sample().is_err());
        source.reset();
        assert_eq!(source.sample().unwrap(), first);
        source.sample_evaluating().unwrap();
        source.sample_evaluating().unwrap();
        assert!(source.sample_evaluating().is_err());
        source.reset_evaluating();
        assert!(source.sample_evaluating().is_ok());
    }

    #[test]
    fn test_sampled_events_are_reproducible_after_reset() {
        let events = Events::from_ids(&[&[1u64, 2, 3, 4][..], &[1, 2, 3, 4]]).unwrap();
        let mut source = SampledEvents::new(events, 5);
        let a: Vec<RealizedEvents> = (0..5).map(|_| source.sample().unwrap()).collect();
        source.reset();
        let b: Vec<RealizedEvents> = (0..5).map(|_| source.sample().unwrap()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inbound_after_skips_current_and_outbound() {
        let events = Events::from_ids(&[&[1u64][..], &[1], &[2], &[2], &[3]]).unwrap();
        let ts: Vec<usize> = events.inbound_after(0).map(|(t, _)| t).collect();
        assert_eq!(ts, vec![2, 4]);
    }
}
