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

use super::{handle_outbound_container, store_outcomes, Outcome, PlacementScope};
use crate::err::{NoSolutionError, SolveError};
use rand::Rng;
use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashSet},
};
use yard_core::{batch::RealizedBatch, cost::Relocations};
use yard_model::terminal::{AbstractTerminal, Terminal};

struct Node {
    key: (Reverse<Relocations>, usize, Reverse<u64>),
    terminal: Terminal,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// The cheapest way through a single batch, ignoring what comes after.
///
/// Branches are expanded cheapest first and, among equally cheap ones,
/// furthest along first; the first branch to finish the batch wins. A state
/// is expanded only on its first, cheapest, visit.
pub fn lowest_outcome<R: Rng + ?Sized>(
    terminal: &Terminal,
    batch: &RealizedBatch,
    scope: &PlacementScope,
    rng: &mut R,
) -> Result<Outcome, SolveError> {
    let start = if batch.is_inbound() {
        terminal.clone()
    } else {
        terminal.reveal_order(batch.containers())
    };

    let mut seq = 0u64;
    let mut queue = BinaryHeap::new();
    queue.push(Node {
        key: (Reverse(Relocations::new(0)), 0, Reverse(seq)),
        terminal: start,
    });
    let mut closed: HashSet<(usize, AbstractTerminal)> = HashSet::new();

    while let Some(Node { key, terminal }) = queue.pop() {
        let (Reverse(cost), progress, _) = key;
        if progress == batch.len() {
            return Ok(Outcome::new(terminal, cost));
        }
        // The first pop of a state is its cheapest.
        if !closed.insert((progress, terminal.abstract_key())) {
            continue;
        }

        let container = batch.containers()[progress];
        let (children, relocated) = if batch.is_inbound() {
            (store_outcomes(&terminal, container, None, scope, rng)?, false)
        } else {
            handle_outbound_container(&terminal, container, scope, rng)?
        };
        let (progress, cost) = if relocated {
            (progress, cost.increment())
        } else {
            (progress + 1, cost)
        };
        for child in children {
            seq += 1;
            queue.push(Node {
                key: (Reverse(cost), progress, Reverse(seq)),
                terminal: child,
            });
        }
    }

    Err(NoSolutionError::new().into())
}
