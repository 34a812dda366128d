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

//! Value-function approximations learned by the ADP engine.

pub mod basis;
pub mod stepsize;
pub mod table;

pub use basis::{BasisConfig, BasisFunctions};
pub use stepsize::StepSize;
pub use table::{InitialEstimator, StateTable};

use yard_model::terminal::Terminal;

/// An estimate of the relocations still to come from a yard state.
///
/// `n` is the training iteration (1-based), `t` the index of the batch
/// about to be handled.
pub trait ValueFunction {
    /// Estimated future cost of `terminal` at time `t`. `corridor`, when
    /// given, restricts block-level features to those block indices.
    fn estimate(&self, n: usize, t: usize, terminal: &Terminal, corridor: Option<&[usize]>) -> f64;

    /// Learns from one observation: starting from `previous` at time `t`,
    /// the episode went on to cost `observed`. `next` is the state the
    /// decision led to, absent when the step failed.
    fn ingest_sample(
        &mut self,
        n: usize,
        t: usize,
        previous: &Terminal,
        next: Option<&Terminal>,
        observed: f64,
    );

    fn on_iteration_complete(&mut self, n: usize);
}

impl<V: ValueFunction + ?Sized> ValueFunction for Box<V> {
    fn estimate(&self, n: usize, t: usize, terminal: &Terminal, corridor: Option<&[usize]>) -> f64 {
        (**self).estimate(n, t, terminal, corridor)
    }

    fn ingest_sample(
        &mut self,
        n: usize,
        t: usize,
        previous: &Terminal,
        next: Option<&Terminal>,
        observed: f64,
    ) {
        (**self).ingest_sample(n, t, previous, next, observed)
    }

    fn on_iteration_complete(&mut self, n: usize) {
        (**self).on_iteration_complete(n)
    }
}
