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

use std::fmt::Display;

/// How observations are fed back to the value function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateMode {
    /// Every step learns the one-step estimate it acted on.
    SinglePass,
    /// The episode is played out first, then every step learns the cost
    /// actually incurred from it to the end.
    #[default]
    DoublePass,
}

impl Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::SinglePass => write!(f, "single"),
            UpdateMode::DoublePass => write!(f, "double"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Evaluate after iterations `1, every + 1, 2 * every + 1, ..`; when
    /// equal to the iteration count, only after the last one. Zero turns
    /// evaluation off.
    pub every: usize,
    pub samples: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            every: 10,
            samples: 1_000,
        }
    }
}

impl EvaluationConfig {
    pub fn due(&self, n: usize, iterations: usize) -> bool {
        match self.every {
            0 => false,
            1 => true,
            every if every == iterations => n == iterations,
            every => n % every == 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacementConfig {
    /// Half-width of the block corridor placements are restricted to.
    pub corridor_size: Option<usize>,
    /// Half-width of the corridor block-level features are evaluated on.
    pub feature_corridor_size: Option<usize>,
    /// Place containers one at a time by value function instead of
    /// enumerating every outcome of a batch.
    pub optimized_outcomes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdpConfig {
    pub discount: f64,
    /// Probability of taking a random decision while training.
    pub epsilon: f64,
    pub iterations: usize,
    pub update_mode: UpdateMode,
    pub seed: u64,
    pub placement: PlacementConfig,
    pub evaluation: EvaluationConfig,
}

impl Default for AdpConfig {
    fn default() -> Self {
        Self {
            discount: 1.0,
            epsilon: 0.05,
            iterations: 250,
            update_mode: UpdateMode::DoublePass,
            seed: 42,
            placement: PlacementConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_schedule() {
        let every_ten = EvaluationConfig {
            every: 10,
            samples: 1,
        };
        let due: Vec<usize> = (1..=25).filter(|&n| every_ten.due(n, 25)).collect();
        assert_eq!(due, vec![1, 11, 21]);

        let at_end = EvaluationConfig {
            every: 25,
            samples: 1,
        };
        let due: Vec<usize> = (1..=25).filter(|&n| at_end.due(n, 25)).collect();
        assert_eq!(due, vec![25]);

        let off = EvaluationConfig {
            every: 0,
            samples: 1,
        };
        assert!((1..=25).all(|n| !off.due(n, 25)));

        let always = EvaluationConfig {
            every: 1,
            samples: 1,
        };
        assert!((1..=3).all(|n| always.due(n, 3)));
    }

    #[test]
    fn test_defaults() {
        let config = AdpConfig::default();
        assert_eq!(config.update_mode, UpdateMode::DoublePass);
        assert_eq!(config.iterations, 250);
        assert_eq!(config.evaluation.every, 10);
        assert_eq!(config.placement.corridor_size, None);
        assert!(!config.placement.optimized_outcomes);
    }
}
