//! Identifiers for tasks spawned by a [`StateCtx`](crate::StateCtx).
//!
//! A `TaskId` pairs the operation kind (a `TypeId` marker) with a generation
//! counter. The context bumps the generation each time a task of the same kind
//! is spawned, and only results tagged with the newest generation are applied.

use std::any::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    kind: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(kind: TypeId, generation: u64) -> Self {
        Self { kind, generation }
    }

    /// Marker type of the operation that spawned the task.
    pub fn kind(&self) -> TypeId {
        self.kind
    }

    /// Higher generations were spawned later.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
