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

//! # Yard Solver (`yard-solver`)
//!
//! Policies that decide where containers go in a stacking yard, and the
//! machinery to judge them.
//!
//! ## Layout
//!
//! - **`outcome`**: every distinct way a realized batch can be handled from
//!   a given yard, the cheapest one, and the one a value function likes best.
//! - **`heuristics`**: the MM placement rule in its standard and adopted
//!   variants, wrapped as a policy that can also compute its own expected
//!   relocations exactly.
//! - **`features`** and **`vfa`**: yard features and the two value function
//!   approximations, a state table and recursive least squares over basis
//!   functions.
//! - **`adp`**: approximate dynamic programming with single and double pass
//!   updates and periodic Monte-Carlo evaluation.
//! - **`pbfs`**: exact expected relocations by probabilistic best-first
//!   search on small instances.
//! - **`policy`**: the `Policy` trait every solver implements, episode
//!   playback and Monte-Carlo evaluation.
//!
//! Failures surface as [`err::SolveError`]; the interesting one is
//! `NoSolution`, returned when some container has no legal place to go.

pub mod adp;
pub mod err;
pub mod expectation;
pub mod features;
pub mod heuristics;
pub mod outcome;
pub mod pbfs;
pub mod policy;
pub mod vfa;

pub mod prelude {
    pub use crate::adp::{AdpConfig, AdpEngine, EvaluationConfig, EvaluationRecord, UpdateMode};
    pub use crate::err::{InconsistentStateError, NoSolutionError, SolveError};
    pub use crate::expectation::Expectation;
    pub use crate::features::{Feature, FeatureSet};
    pub use crate::heuristics::{HeuristicPolicy, MmPolicy, MmRule, MmVariant, PlacementRule};
    pub use crate::outcome::{Outcome, PlacementScope};
    pub use crate::pbfs::Pbfs;
    pub use crate::policy::{MyopicPolicy, Policy, evaluate_policy, run_episode};
    pub use crate::vfa::{BasisConfig, BasisFunctions, StateTable, StepSize, ValueFunction};
}
