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

use crate::{
    block::{Access, Block, Designation},
    err::{
        ContainerAlreadyStoredError, ContainerNotFoundError, InvalidLocationError,
        StackEmptyError, StackFullError, TerminalError,
    },
    location::{Location, StackLocation},
    placement,
    stack::Stack,
};
use std::{collections::HashMap, fmt::Display, sync::Arc};
use yard_core::container::{Container, ContainerId};

/// The whole yard.
///
/// Terminals are immutable values. Every operation that changes the yard
/// returns a new terminal that shares all untouched blocks with its parent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Terminal {
    max_height: usize,
    blocks: Vec<Arc<Block>>,
}

/// Canonical form of a terminal: identities dropped, two-way blocks
/// mirror-normalized and blocks sorted. Two terminals that only differ by
/// which container sits where among equally labelled ones share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbstractTerminal(Terminal);

impl AbstractTerminal {
    #[inline]
    pub fn terminal(&self) -> &Terminal {
        &self.0
    }

    #[inline]
    pub fn into_terminal(self) -> Terminal {
        self.0
    }
}

impl Terminal {
    pub fn new(blocks: Vec<Block>, max_height: usize) -> Self {
        Self {
            max_height,
            blocks: blocks.into_iter().map(Arc::new).collect(),
        }
    }

    /// `num_blocks` one-way blocks holding a single stack each.
    pub fn empty_single_stack_blocks(num_blocks: usize, max_height: usize) -> Self {
        Self::new(
            (0..num_blocks)
                .map(|_| Block::empty(1, Access::OneWay, Designation::UNRESTRICTED))
                .collect(),
            max_height,
        )
    }

    /// `num_bays` two-way bays of five stacks each.
    pub fn empty_bays(num_bays: usize, max_height: usize) -> Self {
        Self::new(
            (0..num_bays)
                .map(|_| Block::empty(5, Access::TwoWay, Designation::UNRESTRICTED))
                .collect(),
            max_height,
        )
    }

    #[inline]
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index).map(|b| b.as_ref())
    }

    #[inline]
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().map(|b| b.as_ref())
    }

    #[inline]
    pub fn stack(&self, location: StackLocation) -> Option<&Stack> {
        self.block(location.block())?.stack(location.stack())
    }

    #[inline]
    pub fn stack_height(&self, location: StackLocation) -> usize {
        self.stack(location).map_or(0, Stack::height)
    }

    pub fn stack_locations(&self) -> impl Iterator<Item = StackLocation> + '_ {
        self.blocks.iter().enumerate().flat_map(|(b, block)| {
            (0..block.num_stacks()).map(move |s| StackLocation::new(b, s))
        })
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.blocks
            .iter()
            .flat_map(|b| b.stacks().iter().flat_map(|s| s.containers().iter()))
    }

    pub fn num_containers(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| b.stacks().iter())
            .map(Stack::height)
            .sum()
    }

    /// Places `container` on top of the stack at `location`.
    pub fn store(
        &self,
        location: StackLocation,
        container: Container,
    ) -> Result<Terminal, TerminalError> {
        let block = self
            .block(location.block())
            .filter(|b| location.stack() < b.num_stacks())
            .ok_or(InvalidLocationError::new(location))?;
        if block.height(location.stack()) >= self.max_height {
            return Err(StackFullError::new(location, self.max_height).into());
        }
        if self.containers().any(|c| c.id() == container.id()) {
            return Err(ContainerAlreadyStoredError::new(container.id()).into());
        }
        Ok(self.with_block(location.block(), block.stored(location.stack(), container)))
    }

    /// Removes the top container of the stack at `location`.
    pub fn retrieve(&self, location: StackLocation) -> Result<(Terminal, Container), TerminalError> {
        let block = self
            .block(location.block())
            .filter(|b| location.stack() < b.num_stacks())
            .ok_or(InvalidLocationError::new(location))?;
        let (block, container) = block
            .retrieved(location.stack())
            .ok_or(StackEmptyError::new(location))?;
        Ok((self.with_block(location.block(), block), container))
    }

    /// Moves the top container of `from` onto `to`.
    pub fn reshuffle(
        &self,
        from: StackLocation,
        to: StackLocation,
    ) -> Result<Terminal, TerminalError> {
        let (terminal, container) = self.retrieve(from)?;
        terminal.store(to, container)
    }

    /// Ranks the given containers by their position (1-based) and forgets
    /// every other rank.
    pub fn reveal_order(&self, containers: &[Container]) -> Terminal {
        let ranks: HashMap<ContainerId, u32> = containers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id(), i as u32 + 1))
            .collect();
        Terminal {
            max_height: self.max_height,
            blocks: self
                .blocks
                .iter()
                .map(|b| Arc::new(b.revealed(&ranks)))
                .collect(),
        }
    }

    pub fn container_location(&self, id: ContainerId) -> Result<Location, ContainerNotFoundError> {
        for (b, block) in self.blocks.iter().enumerate() {
            for (s, stack) in block.stacks().iter().enumerate() {
                if let Some(tier) = stack.containers().iter().position(|c| c.id() == id) {
                    return Ok(Location::new(b, s, tier));
                }
            }
        }
        Err(ContainerNotFoundError::new(id))
    }

    /// Containers that have to leave before the one at `location` can be
    /// reached, in the order they can be taken away.
    pub fn blocking_containers(&self, location: Location) -> Vec<Container> {
        match self.block(location.block()) {
            Some(block) => placement::blocking_containers(block, location.stack(), location.tier()),
            None => Vec::new(),
        }
    }

    pub fn abstract_key(&self) -> AbstractTerminal {
        let mut blocks: Vec<Block> = self.blocks.iter().map(|b| b.abstracted()).collect();
        blocks.sort();
        AbstractTerminal(Terminal::new(blocks, self.max_height))
    }

    fn with_block(&self, index: usize, block: Block) -> Terminal {
        let mut blocks = self.blocks.clone();
        blocks[index] = Arc::new(block);
        Terminal {
            max_height: self.max_height,
            blocks,
        }
    }
}

impl Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "*".repeat(20))?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f, "**")?;
            }
            write!(f, "{}", block)?;
        }
        writeln!(f, "{}", "*".repeat(20))
    }
}
