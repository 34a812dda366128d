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

use crate::stack::Stack;
use std::{collections::HashMap, fmt::Display};
use yard_core::container::{Container, ContainerId};

/// From which side a block is worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    OneWay,
    TwoWay,
}

/// Restricts which containers a block accepts. `Designation::UNRESTRICTED`
/// on a container means it may go anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Designation(u32);

impl Designation {
    pub const UNRESTRICTED: Designation = Designation(0);

    #[inline]
    pub const fn new(value: u32) -> Self {
        Designation(value)
    }

    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_unrestricted(&self) -> bool {
        self.0 == 0
    }
}

impl Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Designation({})", self.0)
    }
}

/// A bay of parallel stacks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block {
    access: Access,
    designation: Designation,
    stacks: Vec<Stack>,
}

impl Block {
    #[inline]
    pub fn new(stacks: Vec<Stack>, access: Access, designation: Designation) -> Self {
        Self {
            access,
            designation,
            stacks,
        }
    }

    pub fn empty(num_stacks: usize, access: Access, designation: Designation) -> Self {
        Self::new(vec![Stack::empty(); num_stacks], access, designation)
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }

    #[inline]
    pub fn is_two_way(&self) -> bool {
        self.access == Access::TwoWay
    }

    #[inline]
    pub fn designation(&self) -> Designation {
        self.designation
    }

    #[inline]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    #[inline]
    pub fn stack(&self, index: usize) -> Option<&Stack> {
        self.stacks.get(index)
    }

    #[inline]
    pub fn num_stacks(&self) -> usize {
        self.stacks.len()
    }

    #[inline]
    pub fn height(&self, index: usize) -> usize {
        self.stacks.get(index).map_or(0, Stack::height)
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.iter().all(Stack::is_empty)
    }

    /// Caller guarantees `index` is in range.
    pub(crate) fn stored(&self, index: usize, container: Container) -> Block {
        let mut stacks = self.stacks.clone();
        stacks[index] = stacks[index].pushed(container);
        Block::new(stacks, self.access, self.designation)
    }

    pub(crate) fn retrieved(&self, index: usize) -> Option<(Block, Container)> {
        let (stack, container) = self.stacks.get(index)?.popped()?;
        let mut stacks = self.stacks.clone();
        stacks[index] = stack;
        Some((Block::new(stacks, self.access, self.designation), container))
    }

    pub(crate) fn revealed(&self, ranks: &HashMap<ContainerId, u32>) -> Block {
        Block::new(
            self.stacks.iter().map(|s| s.revealed(ranks)).collect(),
            self.access,
            self.designation,
        )
    }

    /// Identity-free form. A two-way block equals its mirror image, so the
    /// lexicographically smaller orientation is kept.
    pub fn abstracted(&self) -> Block {
        let stacks: Vec<Stack> = self.stacks.iter().map(Stack::anonymized).collect();
        if self.is_two_way() && stacks.len() > 1 {
            let mirrored: Vec<Stack> = stacks.iter().rev().cloned().collect();
            let stacks = if mirrored < stacks { mirrored } else { stacks };
            return Block::new(stacks, self.access, self.designation);
        }
        Block::new(stacks, self.access, self.designation)
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = match self.access {
            Access::OneWay => ">",
            Access::TwoWay => "<>",
        };
        writeln!(f, "{} {}", side, self.designation.0)?;
        for stack in &self.stacks {
            write!(f, "-")?;
            for (i, c) in stack.containers().iter().enumerate() {
                if i > 0 {
                    write!(f, "|")?;
                }
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
