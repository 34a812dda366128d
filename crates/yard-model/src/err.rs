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

use crate::location::StackLocation;
use std::fmt::Display;
use yard_core::container::ContainerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackFullError {
    location: StackLocation,
    max_height: usize,
}

impl StackFullError {
    #[inline]
    pub fn new(location: StackLocation, max_height: usize) -> Self {
        Self {
            location,
            max_height,
        }
    }

    #[inline]
    pub fn location(&self) -> StackLocation {
        self.location
    }

    #[inline]
    pub fn max_height(&self) -> usize {
        self.max_height
    }
}

impl Display for StackFullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stack {} already holds the maximum of {} containers",
            self.location, self.max_height
        )
    }
}

impl std::error::Error for StackFullError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackEmptyError {
    location: StackLocation,
}

impl StackEmptyError {
    #[inline]
    pub fn new(location: StackLocation) -> Self {
        Self { location }
    }

    #[inline]
    pub fn location(&self) -> StackLocation {
        self.location
    }
}

impl Display for StackEmptyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot retrieve from empty stack {}", self.location)
    }
}

impl std::error::Error for StackEmptyError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidLocationError {
    location: StackLocation,
}

impl InvalidLocationError {
    #[inline]
    pub fn new(location: StackLocation) -> Self {
        Self { location }
    }

    #[inline]
    pub fn location(&self) -> StackLocation {
        self.location
    }
}

impl Display for InvalidLocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stack location {} does not exist", self.location)
    }
}

impl std::error::Error for InvalidLocationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerNotFoundError {
    id: ContainerId,
}

impl ContainerNotFoundError {
    #[inline]
    pub fn new(id: ContainerId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }
}

impl Display for ContainerNotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not stored in the terminal", self.id)
    }
}

impl std::error::Error for ContainerNotFoundError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerAlreadyStoredError {
    id: ContainerId,
}

impl ContainerAlreadyStoredError {
    #[inline]
    pub fn new(id: ContainerId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }
}

impl Display for ContainerAlreadyStoredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is already stored in the terminal", self.id)
    }
}

impl std::error::Error for ContainerAlreadyStoredError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalError {
    StackFull(StackFullError),
    StackEmpty(StackEmptyError),
    InvalidLocation(InvalidLocationError),
    ContainerNotFound(ContainerNotFoundError),
    AlreadyStored(ContainerAlreadyStoredError),
}

impl Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalError::StackFull(e) => write!(f, "{}", e),
            TerminalError::StackEmpty(e) => write!(f, "{}", e),
            TerminalError::InvalidLocation(e) => write!(f, "{}", e),
            TerminalError::ContainerNotFound(e) => write!(f, "{}", e),
            TerminalError::AlreadyStored(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TerminalError {}

impl From<StackFullError> for TerminalError {
    fn from(err: StackFullError) -> Self {
        TerminalError::StackFull(err)
    }
}

impl From<StackEmptyError> for TerminalError {
    fn from(err: StackEmptyError) -> Self {
        TerminalError::StackEmpty(err)
    }
}

impl From<InvalidLocationError> for TerminalError {
    fn from(err: InvalidLocationError) -> Self {
        TerminalError::InvalidLocation(err)
    }
}

impl From<ContainerNotFoundError> for TerminalError {
    fn from(err: ContainerNotFoundError) -> Self {
        TerminalError::ContainerNotFound(err)
    }
}

impl From<ContainerAlreadyStoredError> for TerminalError {
    fn from(err: ContainerAlreadyStoredError) -> Self {
        TerminalError::AlreadyStored(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Training,
    Evaluating,
}

impl Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleKind::Training => write!(f, "training"),
            SampleKind::Evaluating => write!(f, "evaluating"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventsExhaustedError {
    kind: SampleKind,
    available: usize,
}

impl EventsExhaustedError {
    #[inline]
    pub fn new(kind: SampleKind, available: usize) -> Self {
        Self { kind, available }
    }

    #[inline]
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }
}

impl Display for EventsExhaustedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "All {} {} samples have been used",
            self.available, self.kind
        )
    }
}

impl std::error::Error for EventsExhaustedError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplicateContainerError {
    id: ContainerId,
    batch: usize,
}

impl DuplicateContainerError {
    #[inline]
    pub fn new(id: ContainerId, batch: usize) -> Self {
        Self { id, batch }
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }
}

impl Display for DuplicateContainerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} arrives again in batch {} although it already arrived",
            self.id, self.batch
        )
    }
}

impl std::error::Error for DuplicateContainerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventsBuildError {
    DuplicateContainer(DuplicateContainerError),
    UnknownContainer(ContainerNotFoundError),
}

impl Display for EventsBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventsBuildError::DuplicateContainer(e) => write!(f, "{}", e),
            EventsBuildError::UnknownContainer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EventsBuildError {}

impl From<DuplicateContainerError> for EventsBuildError {
    fn from(err: DuplicateContainerError) -> Self {
        EventsBuildError::DuplicateContainer(err)
    }
}

impl From<ContainerNotFoundError> for EventsBuildError {
    fn from(err: ContainerNotFoundError) -> Self {
        EventsBuildError::UnknownContainer(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventGenConfigBuildError {
    MissingNumContainers,
    MissingPeriodSlots,
    ZeroPeriodSlots,
    NonPositiveDwell(f64),
}

impl Display for EventGenConfigBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use EventGenConfigBuildError::*;
        match self {
            MissingNumContainers => write!(f, "Missing num_containers"),
            MissingPeriodSlots => write!(f, "Missing period_slots"),
            ZeroPeriodSlots => write!(f, "period_slots must be positive"),
            NonPositiveDwell(v) => write!(f, "expected_dwell must be positive, got {}", v),
        }
    }
}

impl std::error::Error for EventGenConfigBuildError {}
