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

use super::{StepSize, ValueFunction};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::trace;
use yard_model::terminal::{AbstractTerminal, Terminal};

/// Value of a state the table has not learned yet, given the time step.
pub type InitialEstimator = Arc<dyn Fn(&Terminal, usize) -> f64 + Send + Sync>;

/// Lookup table over aggregated states `(t, abstract terminal)`.
///
/// Unseen states are estimated by the initial estimator, zero unless one is
/// given, which never overestimates a relocation count. Observations made
/// during an iteration only become visible once the iteration completes.
#[derive(Clone)]
pub struct StateTable {
    step: StepSize,
    initial: Option<InitialEstimator>,
    values: HashMap<(usize, AbstractTerminal), f64>,
    pending: HashMap<(usize, AbstractTerminal), f64>,
}

impl fmt::Debug for StateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTable")
            .field("step", &self.step)
            .field("initial", &self.initial.as_ref().map(|_| "<fn>"))
            .field("values", &self.values.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl StateTable {
    pub fn new(step: StepSize) -> Self {
        Self {
            step,
            initial: None,
            values: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// A table that estimates unseen states with `initial` instead of zero.
    pub fn with_initial_estimator<F>(step: StepSize, initial: F) -> Self
    where
        F: Fn(&Terminal, usize) -> f64 + Send + Sync + 'static,
    {
        Self {
            initial: Some(Arc::new(initial)),
            ..Self::new(step)
        }
    }

    fn lookup(&self, t: usize, key: &(usize, AbstractTerminal), terminal: &Terminal) -> f64 {
        match self.values.get(key) {
            Some(&v) => v,
            None => self.initial.as_ref().map_or(0.0, |f| f(terminal, t)),
        }
    }

    #[inline]
    pub fn step_size(&self) -> &StepSize {
        &self.step
    }

    /// Number of states with a learned value.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueFunction for StateTable {
    fn estimate(&self, _n: usize, t: usize, terminal: &Terminal, _corridor: Option<&[usize]>) -> f64 {
        self.lookup(t, &(t, terminal.abstract_key()), terminal)
    }

    fn ingest_sample(
        &mut self,
        _n: usize,
        t: usize,
        previous: &Terminal,
        _next: Option<&Terminal>,
        observed: f64,
    ) {
        let key = (t, previous.abstract_key());
        let old = self.lookup(t, &key, previous);
        let alpha = self.step.alpha();
        self.pending.insert(key, (1.0 - alpha) * old + alpha * observed);
    }

    fn on_iteration_complete(&mut self, n: usize) {
        trace!(iteration = n, updated = self.pending.len(), "merging table updates");
        self.values.extend(self.pending.drain());
        self.step.on_iteration_complete(n);
    }
}
