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
use yard_core::container::ContainerId;
use yard_model::{
    err::{EventsExhaustedError, TerminalError},
    terminal::Terminal,
};

/// No legal completion exists: a batch step, a greedy placement or a full
/// search ran out of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NoSolutionError {
    batch: Option<usize>,
    container: Option<ContainerId>,
}

impl NoSolutionError {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_batch(self, batch: usize) -> Self {
        Self {
            batch: Some(batch),
            ..self
        }
    }

    #[inline]
    pub fn with_container(self, container: ContainerId) -> Self {
        Self {
            container: Some(container),
            ..self
        }
    }

    #[inline]
    pub fn batch(&self) -> Option<usize> {
        self.batch
    }

    #[inline]
    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }
}

impl Display for NoSolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No feasible solution")?;
        if let Some(c) = self.container {
            write!(f, " for {}", c)?;
        }
        if let Some(b) = self.batch {
            write!(f, " in batch {}", b)?;
        }
        Ok(())
    }
}

impl std::error::Error for NoSolutionError {}

/// The yard disagrees with what a solver derived from it, e.g. a retrieve
/// hands back another container than the one located. Carries the state the
/// step started from and the state it failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistentStateError {
    error: TerminalError,
    start: Terminal,
    current: Terminal,
}

impl InconsistentStateError {
    #[inline]
    pub fn new(error: TerminalError, start: Terminal, current: Terminal) -> Self {
        Self {
            error,
            start,
            current,
        }
    }

    #[inline]
    pub fn error(&self) -> &TerminalError {
        &self.error
    }

    #[inline]
    pub fn start(&self) -> &Terminal {
        &self.start
    }

    #[inline]
    pub fn current(&self) -> &Terminal {
        &self.current
    }
}

impl Display for InconsistentStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Inconsistent yard state: {}\nstart:\n{}current:\n{}",
            self.error, self.start, self.current
        )
    }
}

impl std::error::Error for InconsistentStateError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    NoSolution(NoSolutionError),
    Inconsistent(Box<InconsistentStateError>),
    EventsExhausted(EventsExhaustedError),
}

impl SolveError {
    /// Attaches the batch index to a no-solution error that has none yet.
    pub fn at_batch(self, batch: usize) -> Self {
        match self {
            SolveError::NoSolution(e) if e.batch().is_none() => {
                SolveError::NoSolution(e.with_batch(batch))
            }
            other => other,
        }
    }

    #[inline]
    pub fn is_no_solution(&self) -> bool {
        matches!(self, SolveError::NoSolution(_))
    }
}

impl Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::NoSolution(e) => write!(f, "{}", e),
            SolveError::Inconsistent(e) => write!(f, "{}", e),
            SolveError::EventsExhausted(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SolveError {}

impl From<NoSolutionError> for SolveError {
    fn from(err: NoSolutionError) -> Self {
        SolveError::NoSolution(err)
    }
}

impl From<InconsistentStateError> for SolveError {
    fn from(err: InconsistentStateError) -> Self {
        SolveError::Inconsistent(Box::new(err))
    }
}

impl From<EventsExhaustedError> for SolveError {
    fn from(err: EventsExhaustedError) -> Self {
        SolveError::EventsExhausted(err)
    }
}
