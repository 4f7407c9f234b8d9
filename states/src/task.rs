//! Identity and cancellation for command tasks.
//!
//! Every flush of a command spawns one task. The task is identified by the
//! command's `TypeId` plus a generation counter that grows with each flush of
//! the same command, so a newer flush can tell which results are stale.

use std::any::TypeId;

use tokio_util::sync::CancellationToken;

/// Unique identifier for a spawned command task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self { type_id, generation }
    }

    /// The command type that spawned the task.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Higher generations were flushed later.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A spawned task's id together with its cancellation token.
///
/// Cancellation is cooperative: the command observes it through the token it
/// was handed (`token.cancelled()` in a `tokio::select!`), and the context
/// discards anything a cancelled task still publishes.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoadPage;
    struct RequestIrecs;

    #[test]
    fn ids_differ_by_command_and_generation() {
        let first = TaskId::new(TypeId::of::<LoadPage>(), 1);
        let second = TaskId::new(TypeId::of::<LoadPage>(), 2);
        let request = TaskId::new(TypeId::of::<RequestIrecs>(), 1);

        assert_ne!(first, second, "generations tell flushes apart");
        assert_ne!(first, request, "commands tell tasks apart");
        assert_eq!(first.type_id(), second.type_id(), "same command type");
        assert!(second.generation() > first.generation(), "later flush, higher generation");
    }

    #[test]
    fn cloned_handles_share_the_token() {
        let token = CancellationToken::new();
        let handle = TaskHandle::new(TaskId::new(TypeId::of::<LoadPage>(), 3), token.clone());
        let clone = handle.clone();

        assert!(!clone.is_cancelled(), "fresh handle is live");
        handle.cancel();

        assert!(clone.is_cancelled(), "clone sees the cancellation");
        assert!(token.is_cancelled(), "original token is cancelled");
        assert_eq!(clone.id().generation(), 3, "clone keeps the id");
    }
}
