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

/// How much weight a fresh observation gets when smoothed into a table
/// entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSize {
    /// Drops by `step` after every iteration, never below `step`.
    Fixed { alpha: f64, step: f64 },
    /// `lambda / (lambda + n - 1)` in iteration `n`, never below `min`.
    /// Larger `lambda` decays more slowly than the plain `1/n` rule.
    Harmonic { alpha: f64, lambda: f64, min: f64 },
}

impl StepSize {
    #[inline]
    pub fn fixed(initial: f64, step: f64) -> Self {
        StepSize::Fixed {
            alpha: initial,
            step,
        }
    }

    /// Starts at 1, the value of the first iteration.
    #[inline]
    pub fn harmonic(lambda: f64, min: f64) -> Self {
        StepSize::Harmonic {
            alpha: 1.0,
            lambda,
            min,
        }
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        match *self {
            StepSize::Fixed { alpha, .. } | StepSize::Harmonic { alpha, .. } => alpha,
        }
    }

    /// Moves to the step size of iteration `n + 1`.
    pub fn on_iteration_complete(&mut self, n: usize) {
        match self {
            StepSize::Fixed { alpha, step } => {
                *alpha = (*step).max(*alpha - *step);
            }
            StepSize::Harmonic { alpha, lambda, min } => {
                *alpha = (*lambda / (*lambda + n as f64)).max(*min);
            }
        }
    }
}

impl Display for StepSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepSize::Fixed { alpha, step } => write!(f, "Fixed(alpha={:.4}, step={})", alpha, step),
            StepSize::Harmonic { alpha, lambda, min } => {
                write!(f, "Harmonic(alpha={:.4}, lambda={}, min={})", alpha, lambda, min)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_after_one_update() {
        let mut s = StepSize::fixed(1.0, 0.05);
        assert_eq!(s.alpha(), 1.0);
        s.on_iteration_complete(1);
        assert!((s.alpha() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_step_floors_at_step() {
        let mut s = StepSize::fixed(0.12, 0.05);
        for n in 1..10 {
            s.on_iteration_complete(n);
        }
        assert!((s.alpha() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_harmonic_follows_generalized_one_over_n() {
        let mut s = StepSize::harmonic(1.0, 0.05);
        assert_eq!(s.alpha(), 1.0);
        s.on_iteration_complete(1);
        assert!((s.alpha() - 0.5).abs() < 1e-12);
        s.on_iteration_complete(3);
        assert!((s.alpha() - 0.25).abs() < 1e-12);
        s.on_iteration_complete(100);
        assert!((s.alpha() - 0.05).abs() < 1e-12);

        let mut slow = StepSize::harmonic(10.0, 0.0);
        slow.on_iteration_complete(10);
        assert!((slow.alpha() - 0.5).abs() < 1e-12);
    }
}
