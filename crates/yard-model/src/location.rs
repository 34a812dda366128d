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

/// Address of a stack: block index and stack index within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackLocation {
    block: usize,
    stack: usize,
}

impl StackLocation {
    #[inline]
    pub const fn new(block: usize, stack: usize) -> Self {
        Self { block, stack }
    }

    #[inline]
    pub const fn block(&self) -> usize {
        self.block
    }

    #[inline]
    pub const fn stack(&self) -> usize {
        self.stack
    }

    #[inline]
    pub const fn at_tier(&self, tier: usize) -> Location {
        Location::new(self.block, self.stack, tier)
    }
}

impl Display for StackLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.block, self.stack)
    }
}

/// Exact slot of a container: block, stack and tier (0 is the ground).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    block: usize,
    stack: usize,
    tier: usize,
}

impl Location {
    #[inline]
    pub const fn new(block: usize, stack: usize, tier: usize) -> Self {
        Self { block, stack, tier }
    }

    #[inline]
    pub const fn block(&self) -> usize {
        self.block
    }

    #[inline]
    pub const fn stack(&self) -> usize {
        self.stack
    }

    #[inline]
    pub const fn tier(&self) -> usize {
        self.tier
    }

    #[inline]
    pub const fn stack_location(&self) -> StackLocation {
        StackLocation::new(self.block, self.stack)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.block, self.stack, self.tier)
    }
}

impl From<Location> for StackLocation {
    #[inline]
    fn from(value: Location) -> Self {
        value.stack_location()
    }
}
