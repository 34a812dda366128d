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

//! Basis features describing a yard state for linear value functions.

use crate::heuristics::mm::{crl_cost, mm_retrieval_cost, MmVariant};
use nalgebra::DVector;
use yard_core::container::Container;
use yard_model::{
    block::Block,
    events::Events,
    placement::{reachable, Designations},
    stack::Stack,
    terminal::Terminal,
};

/// Weight of the MM simulation in the composite measures; CRL gets the rest.
const COMPOSITE_MM_WEIGHT: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    /// Sum of the stack lower bounds.
    BlockingContainers,
    /// Stacks with a positive lower bound.
    UnorderedStacks,
    /// Blend of the MM retrieval simulation and the CRL count.
    CompositeMeasure,
    /// As `CompositeMeasure`, simulating with the adopted MM rule.
    CompositeAdoptedMeasure,
    /// Signed sum of label drops between vertically adjacent containers.
    BatchLabelDifference,
    /// Mean height of the non-empty stacks.
    AverageStackHeight,
    NonReachableStacks,
    /// Containers that cannot be picked right away.
    NonReachableContainers,
    /// Stacks holding something that stays past a coming arrival which
    /// leaves no later.
    FutureBlockingStacks,
    /// Coming arrivals that will find something in the yard they could end
    /// up on top of.
    FutureBlockingContainers,
    Constant(f64),
}

/// What a feature may look at besides the yard itself.
#[derive(Debug, Clone, Copy)]
pub struct FeatureContext<'a> {
    events: &'a Events,
    designations: &'a Designations,
    t: usize,
    corridor: Option<&'a [usize]>,
}

impl<'a> FeatureContext<'a> {
    #[inline]
    pub fn new(
        events: &'a Events,
        designations: &'a Designations,
        t: usize,
        corridor: Option<&'a [usize]>,
    ) -> Self {
        Self {
            events,
            designations,
            t,
            corridor,
        }
    }

    fn block_indices(&self, terminal: &Terminal) -> Vec<usize> {
        match self.corridor {
            Some(c) => c.to_vec(),
            None => (0..terminal.num_blocks()).collect(),
        }
    }

    fn blocks<'t>(&self, terminal: &'t Terminal) -> Vec<&'t Block> {
        self.block_indices(terminal)
            .into_iter()
            .filter_map(|b| terminal.block(b))
            .collect()
    }

    /// Inbound batches after the current one.
    fn future_arrivals(&self) -> impl Iterator<Item = (usize, &'a [Container])> + 'a {
        self.events
            .inbound_after(self.t)
            .map(|(t, batch)| (t, batch.containers()))
    }
}

/// Whether a container is still in the yard when batch `t` is handled.
/// Label `l` leaves with batch `2l + 1`.
#[inline]
fn stays_past(container: &Container, t: usize) -> bool {
    2 * container.label().value() as usize + 1 > t
}

fn all_stacks(terminal: &Terminal) -> impl Iterator<Item = &Stack> {
    terminal.blocks().flat_map(|b| b.stacks().iter())
}

impl Feature {
    pub fn evaluate(&self, terminal: &Terminal, context: &FeatureContext<'_>) -> f64 {
        match *self {
            Feature::BlockingContainers => all_stacks(terminal)
                .map(Stack::blocking_lower_bound)
                .sum(),
            Feature::UnorderedStacks => all_stacks(terminal)
                .filter(|s| s.blocking_lower_bound() > 0.0)
                .count() as f64,
            Feature::CompositeMeasure => composite(terminal, context, MmVariant::Standard),
            Feature::CompositeAdoptedMeasure => composite(terminal, context, MmVariant::Adopted),
            Feature::BatchLabelDifference => context
                .blocks(terminal)
                .into_iter()
                .flat_map(|b| b.stacks().iter())
                .map(label_difference)
                .sum(),
            Feature::AverageStackHeight => {
                let heights: Vec<usize> = all_stacks(terminal)
                    .map(Stack::height)
                    .filter(|&h| h > 0)
                    .collect();
                if heights.is_empty() {
                    0.0
                } else {
                    heights.iter().sum::<usize>() as f64 / heights.len() as f64
                }
            }
            Feature::NonReachableStacks => terminal
                .blocks()
                .map(|b| (0..b.num_stacks()).filter(|&s| !reachable(b, s)).count())
                .sum::<usize>() as f64,
            Feature::NonReachableContainers => context
                .blocks(terminal)
                .into_iter()
                .map(|b| {
                    (0..b.num_stacks())
                        .map(|s| {
                            let h = b.height(s);
                            if reachable(b, s) { h.saturating_sub(1) } else { h }
                        })
                        .sum::<usize>()
                })
                .sum::<usize>() as f64,
            Feature::FutureBlockingStacks => {
                let arrivals: Vec<_> = context.future_arrivals().collect();
                all_stacks(terminal)
                    .filter(|s| blocks_in_future(s, &arrivals))
                    .count() as f64
            }
            Feature::FutureBlockingContainers => {
                let stacks: Vec<&Stack> = all_stacks(terminal).filter(|s| !s.is_empty()).collect();
                context
                    .future_arrivals()
                    .flat_map(|(t, arrivals)| arrivals.iter().map(move |c| (t, c)))
                    .filter(|(t, arriving)| {
                        stacks.iter().any(|s| {
                            s.containers()
                                .iter()
                                .any(|r| stays_past(r, *t) && r.label() <= arriving.label())
                        })
                    })
                    .count() as f64
            }
            Feature::Constant(v) => v,
        }
    }
}

fn composite(terminal: &Terminal, context: &FeatureContext<'_>, variant: MmVariant) -> f64 {
    let blocks = context.block_indices(terminal);
    let mm = mm_retrieval_cost(terminal, &blocks, context.designations, variant);
    let crl = crl_cost(terminal, &blocks, context.designations);
    COMPOSITE_MM_WEIGHT * mm.as_f64() + (1.0 - COMPOSITE_MM_WEIGHT) * crl.as_f64()
}

fn label_difference(stack: &Stack) -> f64 {
    stack
        .containers()
        .windows(2)
        .map(|w| w[0].label().value() as f64 - w[1].label().value() as f64)
        .sum()
}

/// Walks the coming inbound batches in order. A stack stops being a threat
/// once nothing in it outlives the batch.
fn blocks_in_future(stack: &Stack, arrivals: &[(usize, &[Container])]) -> bool {
    for (t, incoming) in arrivals {
        let remaining: Vec<&Container> =
            stack.containers().iter().filter(|c| stays_past(c, *t)).collect();
        if remaining.is_empty() {
            return false;
        }
        if incoming
            .iter()
            .any(|a| remaining.iter().any(|r| r.label() >= a.label()))
        {
            return true;
        }
    }
    false
}

/// An ordered list of features, evaluated into one vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    #[inline]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    #[inline]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn evaluate(&self, terminal: &Terminal, context: &FeatureContext<'_>) -> DVector<f64> {
        DVector::from_iterator(
            self.features.len(),
            self.features.iter().map(|f| f.evaluate(terminal, context)),
        )
    }

    /// Replaces the value of every constant feature.
    pub fn with_constant(mut self, value: f64) -> Self {
        for f in &mut self.features {
            if let Feature::Constant(v) = f {
                *v = value;
            }
        }
        self
    }

    pub fn vfa1() -> Self {
        use Feature::*;
        Self::new(vec![
            BlockingContainers,
            UnorderedStacks,
            CompositeMeasure,
            BatchLabelDifference,
            AverageStackHeight,
            NonReachableStacks,
            NonReachableContainers,
            FutureBlockingStacks,
            FutureBlockingContainers,
            Constant(1.0),
        ])
    }

    pub fn vfa2() -> Self {
        use Feature::*;
        Self::new(vec![
            BlockingContainers,
            AverageStackHeight,
            NonReachableStacks,
            FutureBlockingStacks,
            Constant(1.0),
        ])
    }

    pub fn vfa3() -> Self {
        use Feature::*;
        Self::new(vec![
            CompositeMeasure,
            BatchLabelDifference,
            NonReachableStacks,
            FutureBlockingContainers,
            Constant(1.0),
        ])
    }

    pub fn vfa4() -> Self {
        use Feature::*;
        Self::new(vec![
            UnorderedStacks,
            BatchLabelDifference,
            NonReachableStacks,
            NonReachableContainers,
            Constant(1.0),
        ])
    }

    pub fn vfa5() -> Self {
        use Feature::*;
        Self::new(vec![
            BlockingContainers,
            UnorderedStacks,
            NonReachableStacks,
            Constant(1.0),
        ])
    }

    /// `vfa3` with the adopted composite measure.
    pub fn vfa6() -> Self {
        use Feature::*;
        Self::new(vec![
            CompositeAdoptedMeasure,
            BatchLabelDifference,
            NonReachableStacks,
            FutureBlockingContainers,
            Constant(1.0),
        ])
    }
}
