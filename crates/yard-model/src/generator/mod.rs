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

mod config;

pub use config::{EventGenConfig, EventGenConfigBuilder};

use crate::events::Events;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp1};
use tracing::debug;
use yard_core::{
    batch::{Batch, Direction},
    container::{Container, ContainerId, Label},
};

/// Draws random scenarios.
///
/// Each container arrives in a uniformly drawn slot and stays for an
/// exponentially distributed number of slots. Containers whose departure
/// falls beyond the period only show up inbound.
pub struct EventGenerator {
    config: EventGenConfig,
    rng: ChaCha8Rng,
}

impl From<EventGenConfig> for EventGenerator {
    fn from(config: EventGenConfig) -> Self {
        Self::new(config)
    }
}

impl EventGenerator {
    pub fn new(config: EventGenConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed()),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EventGenConfig {
        &self.config
    }

    #[inline]
    fn sample_dwell(&mut self) -> usize {
        let unit: f64 = Exp1.sample(&mut self.rng);
        (unit * self.config.expected_dwell).round() as usize
    }

    pub fn generate(&mut self) -> Events {
        let slots = self.config.period_slots();
        let mut batches: Vec<Vec<Container>> = vec![Vec::new(); self.config.num_batches()];

        for id in 1..=self.config.num_containers() as u64 {
            let arrival = self.rng.random_range(0..slots);
            let departure = arrival + self.sample_dwell();
            let container = Container::new(ContainerId::new(id), Label::new(departure as u32));
            batches[arrival * 2].push(container);
            if departure < slots {
                batches[departure * 2 + 1].push(container);
            }
        }

        let events = Events::new(
            batches
                .into_iter()
                .enumerate()
                .map(|(i, containers)| Batch::new(Direction::alternating(i), containers))
                .collect(),
        );
        debug!(
            batches = events.len(),
            containers = self.config.num_containers(),
            "generated scenario"
        );
        events
    }
}
