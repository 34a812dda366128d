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

use super::ValueFunction;
use crate::features::{FeatureContext, FeatureSet};
use nalgebra::{DMatrix, DVector};
use std::collections::{BTreeMap, HashMap};
use tracing::{trace, warn};
use yard_model::{events::Events, placement::Designations, terminal::Terminal};

/// Smallest forgetting factor used; `delta >= n` would otherwise reach zero.
const MIN_FORGETTING: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisConfig {
    /// Every weight starts here.
    pub initial_weight: f64,
    /// Forgetting factor of the recursive least squares update.
    pub delta: f64,
    /// Scale of the identity the covariance matrix starts from.
    pub epsilon: f64,
}

impl Default for BasisConfig {
    fn default() -> Self {
        Self {
            initial_weight: 1.0,
            delta: 0.9,
            epsilon: 0.1,
        }
    }
}

/// Linear value function over a set of yard features, one weight vector
/// per time step, fitted by recursive least squares.
///
/// Weights and covariance matrices are recorded per iteration. Looking up
/// iteration `n` falls back to the latest iteration before it that touched
/// the same time step, and to the initial values if none did.
#[derive(Debug, Clone)]
pub struct BasisFunctions {
    features: FeatureSet,
    config: BasisConfig,
    events: Events,
    designations: Designations,
    initial_weights: DVector<f64>,
    initial_matrix: DMatrix<f64>,
    history: HashMap<usize, BTreeMap<usize, (DVector<f64>, DMatrix<f64>)>>,
}

impl BasisFunctions {
    pub fn new(
        features: FeatureSet,
        config: BasisConfig,
        events: Events,
        designations: Designations,
    ) -> Self {
        let k = features.len();
        Self {
            initial_weights: DVector::from_element(k, config.initial_weight),
            initial_matrix: DMatrix::identity(k, k) * config.epsilon,
            features,
            config,
            events,
            designations,
            history: HashMap::new(),
        }
    }

    #[inline]
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    #[inline]
    pub fn config(&self) -> &BasisConfig {
        &self.config
    }

    /// Weights in effect for time `t` in iteration `n`.
    pub fn weights(&self, n: usize, t: usize) -> &DVector<f64> {
        self.last_known(n, t).map_or(&self.initial_weights, |(w, _)| w)
    }

    fn last_known(&self, n: usize, t: usize) -> Option<&(DVector<f64>, DMatrix<f64>)> {
        self.history
            .get(&t)
            .and_then(|per_n| per_n.range(..=n).next_back())
            .map(|(_, entry)| entry)
    }

    fn evaluate(&self, t: usize, terminal: &Terminal, corridor: Option<&[usize]>) -> DVector<f64> {
        let context = FeatureContext::new(&self.events, &self.designations, t, corridor);
        self.features.evaluate(terminal, &context)
    }

    #[inline]
    fn forgetting(&self, n: usize) -> f64 {
        (1.0 - self.config.delta / n.max(1) as f64).max(MIN_FORGETTING)
    }
}

impl ValueFunction for BasisFunctions {
    fn estimate(&self, n: usize, t: usize, terminal: &Terminal, corridor: Option<&[usize]>) -> f64 {
        self.weights(n, t).dot(&self.evaluate(t, terminal, corridor))
    }

    fn ingest_sample(
        &mut self,
        n: usize,
        t: usize,
        previous: &Terminal,
        _next: Option<&Terminal>,
        observed: f64,
    ) {
        let prior = n.saturating_sub(1);
        let phi = self.evaluate(t, previous, None);
        let (weights, matrix) = match self.last_known(prior, t) {
            Some((w, b)) => (w.clone(), b.clone()),
            None => (self.initial_weights.clone(), self.initial_matrix.clone()),
        };
        let error = weights.dot(&phi) - observed;

        let alpha = self.forgetting(n);
        let b_phi = &matrix * &phi;
        let gamma = alpha + phi.dot(&b_phi);
        if gamma.is_nan() || gamma <= f64::EPSILON {
            warn!(iteration = n, t, gamma, "degenerate rls gain, sample skipped");
            return;
        }
        let weights = weights - &b_phi * (error / gamma);
        let matrix = (matrix - (&b_phi * b_phi.transpose()) / gamma) / alpha;

        trace!(iteration = n, t, error, gamma, "rls update");
        self.history
            .entry(t)
            .or_default()
            .insert(n, (weights, matrix));
    }

    fn on_iteration_complete(&mut self, _n: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;

    fn constant_only(value: f64) -> BasisFunctions {
        BasisFunctions::new(
            FeatureSet::new(vec![Feature::Constant(value)]),
            BasisConfig::default(),
            Events::new(vec![]),
            Designations::new(),
        )
    }

    #[test]
    fn test_initial_estimate_is_weighted_feature_sum() {
        let vfa = constant_only(3.0);
        let t = Terminal::empty_single_stack_blocks(1, 1);
        assert_eq!(vfa.estimate(1, 0, &t, None), 3.0);
    }

    #[test]
    fn test_rls_converges_to_observed_value() {
        let mut vfa = constant_only(100.0);
        let t = Terminal::empty_single_stack_blocks(1, 1);
        for n in 1..=60 {
            vfa.ingest_sample(n, 1, &t, None, 2.0);
            vfa.on_iteration_complete(n);
        }
        assert!((vfa.estimate(60, 1, &t, None) - 2.0).abs() < 1e-3);
        // other time steps are untouched
        assert_eq!(vfa.estimate(60, 0, &t, None), 100.0);
    }

    #[test]
    fn test_large_delta_keeps_weights_finite() {
        let mut vfa = BasisFunctions::new(
            FeatureSet::new(vec![Feature::Constant(1.0), Feature::Constant(0.0)]),
            BasisConfig {
                delta: 3.0,
                ..BasisConfig::default()
            },
            Events::new(vec![]),
            Designations::new(),
        );
        let t = Terminal::empty_single_stack_blocks(1, 1);
        for n in 1..=5 {
            vfa.ingest_sample(n, 0, &t, None, 4.0);
            vfa.on_iteration_complete(n);
        }
        assert!(vfa.weights(5, 0).iter().all(|w| w.is_finite()));
        assert!(vfa.estimate(5, 0, &t, None).is_finite());
    }

    #[test]
    fn test_lookup_walks_back_to_latest_iteration() {
        let mut vfa = constant_only(1.0);
        let t = Terminal::empty_single_stack_blocks(1, 1);
        vfa.ingest_sample(3, 0, &t, None, 5.0);
        let at_three = vfa.weights(3, 0).clone();
        assert_ne!(at_three, vfa.initial_weights);
        assert_eq!(vfa.weights(7, 0), &at_three);
        assert_eq!(vfa.weights(2, 0), &vfa.initial_weights);
    }

    #[test]
    fn test_first_update_matches_closed_form() {
        let mut vfa = constant_only(1.0);
        let t = Terminal::empty_single_stack_blocks(1, 1);
        vfa.ingest_sample(1, 0, &t, None, 3.0);
        // alpha = 0.1, B = 0.1, phi = 1: gamma = 0.2, w = 1 - 0.1 * (1 - 3) / 0.2
        assert!((vfa.weights(1, 0)[0] - 2.0).abs() < 1e-12);
    }
}
