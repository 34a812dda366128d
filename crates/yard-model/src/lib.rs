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

//! # Yard Model (`yard-model`)
//!
//! The stacking yard and everything needed to reason about it physically.
//!
//! ## Key Data Structures
//!
//! - **`Stack`**: containers bottom first, with a cached lower bound on the
//!   relocations it will cause.
//! - **`Block`**: parallel stacks worked from one side (`Access::OneWay`) or
//!   both (`Access::TwoWay`), optionally reserved by a `Designation`.
//! - **`Terminal`**: the whole yard. Terminals are persistent: `store`,
//!   `retrieve` and `reshuffle` hand back a new terminal that shares every
//!   untouched block with the old one, so search code can keep thousands of
//!   them around. `abstract_key` yields the canonical form used to memoize.
//! - **`Events`** and **`EventSource`**: the planned batches of a scenario and
//!   the streams of realizations training and evaluation draw from.
//!
//! The rules in `placement` (reachability, blocking containers, bay filling,
//! corridors) are shared by every policy in `yard-solver`.

pub mod block;
pub mod err;
pub mod events;
pub mod generator;
pub mod location;
pub mod placement;
pub mod stack;
pub mod terminal;

pub mod prelude {
    pub use crate::block::{Access, Block, Designation};
    pub use crate::err::{
        ContainerNotFoundError, EventsBuildError, EventsExhaustedError, TerminalError,
    };
    pub use crate::events::{EvaluatableEvents, EventSource, Events, RealizedEvents, SampledEvents};
    pub use crate::generator::{EventGenConfig, EventGenConfigBuilder, EventGenerator};
    pub use crate::location::{Location, StackLocation};
    pub use crate::placement::Designations;
    pub use crate::stack::Stack;
    pub use crate::terminal::{AbstractTerminal, Terminal};
}
