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

use crate::err::EventGenConfigBuildError;
use rand::Rng;
use std::fmt::Display;

/// Configuration for synthetic scenario generation.
///
/// The planning period is split into `period_slots` slots. Every slot owns
/// one inbound batch followed by one outbound batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventGenConfig {
    pub(crate) num_containers: usize,
    pub(crate) period_slots: usize,
    pub(crate) expected_dwell: f64,
    pub(crate) seed: u64,
}

impl Default for EventGenConfig {
    fn default() -> Self {
        Self {
            num_containers: 20,
            period_slots: 4,
            expected_dwell: 2.0,
            seed: 42,
        }
    }
}

impl EventGenConfig {
    pub fn new(
        num_containers: usize,
        period_slots: usize,
        expected_dwell: f64,
        seed: u64,
    ) -> Result<Self, EventGenConfigBuildError> {
        if period_slots == 0 {
            return Err(EventGenConfigBuildError::ZeroPeriodSlots);
        }
        if expected_dwell.is_nan() || expected_dwell <= 0.0 {
            return Err(EventGenConfigBuildError::NonPositiveDwell(expected_dwell));
        }
        Ok(Self {
            num_containers,
            period_slots,
            expected_dwell,
            seed,
        })
    }

    #[inline]
    pub fn num_containers(&self) -> usize {
        self.num_containers
    }

    #[inline]
    pub fn period_slots(&self) -> usize {
        self.period_slots
    }

    #[inline]
    pub fn expected_dwell(&self) -> f64 {
        self.expected_dwell
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of batches a generated scenario has.
    #[inline]
    pub fn num_batches(&self) -> usize {
        self.period_slots * 2
    }
}

impl Display for EventGenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EventGenConfig {{ num_containers: {}, period_slots: {}, expected_dwell: {:.4}, seed: {} }}",
            self.num_containers, self.period_slots, self.expected_dwell, self.seed
        )
    }
}

/// Builder for `EventGenConfig`.
#[derive(Debug, Clone)]
pub struct EventGenConfigBuilder {
    // Required
    num_containers: Option<usize>,
    period_slots: Option<usize>,

    // Optional with defaults
    expected_dwell: f64,
    seed: u64,
}

impl Default for EventGenConfigBuilder {
    fn default() -> Self {
        Self {
            num_containers: None,
            period_slots: None,
            expected_dwell: 2.0,
            seed: rand::rng().random(),
        }
    }
}

impl EventGenConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn num_containers(mut self, v: usize) -> Self {
        self.num_containers = Some(v);
        self
    }

    #[inline]
    pub fn period_slots(mut self, v: usize) -> Self {
        self.period_slots = Some(v);
        self
    }

    #[inline]
    pub fn expected_dwell(mut self, v: f64) -> Self {
        self.expected_dwell = v;
        self
    }

    pub fn random_seed(mut self) -> Self {
        self.seed = rand::rng().random();
        self
    }

    #[inline]
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    pub fn build(self) -> Result<EventGenConfig, EventGenConfigBuildError> {
        use EventGenConfigBuildError::*;
        let num_containers = self.num_containers.ok_or(MissingNumContainers)?;
        let period_slots = self.period_slots.ok_or(MissingPeriodSlots)?;
        EventGenConfig::new(num_containers, period_slots, self.expected_dwell, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_counts() {
        let err = EventGenConfigBuilder::new().period_slots(3).build();
        assert_eq!(err, Err(EventGenConfigBuildError::MissingNumContainers));
        let err = EventGenConfigBuilder::new().num_containers(3).build();
        assert_eq!(err, Err(EventGenConfigBuildError::MissingPeriodSlots));
    }

    #[test]
    fn test_builder_validates_values() {
        let base = EventGenConfigBuilder::new().num_containers(5).seed(1);
        assert_eq!(
            base.clone().period_slots(0).build(),
            Err(EventGenConfigBuildError::ZeroPeriodSlots)
        );
        assert!(matches!(
            base.clone().period_slots(2).expected_dwell(0.0).build(),
            Err(EventGenConfigBuildError::NonPositiveDwell(_))
        ));
        let cfg = base.period_slots(3).expected_dwell(1.5).build().unwrap();
        assert_eq!(cfg.num_batches(), 6);
        assert_eq!(cfg.seed(), 1);
    }
}
