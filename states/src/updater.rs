use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;
use tokio_util::sync::CancellationToken;

use crate::{State, TaskId};

/// One queued update: `value` is handed to the `assign_box` of the state
/// registered under `target`.
pub(crate) struct Envelope {
    pub(crate) target: TypeId,
    pub(crate) origin: Option<TaskId>,
    pub(crate) value: Box<dyn Any + Send>,
}

/// Unconditional update channel into a [`StateCtx`](crate::StateCtx).
///
/// Updates are queued and applied by `StateCtx::sync_updates` on the context
/// thread.
#[derive(Clone)]
pub struct Updater {
    send: Sender<Envelope>,
}

impl Updater {
    pub(crate) fn new(send: Sender<Envelope>) -> Self {
        Self { send }
    }

    /// Replace state `T` with `value`.
    pub fn set<T: State + Send>(&self, value: T) {
        self.send_to::<T>(value);
    }

    /// Route an arbitrary payload to state `S`; `S::assign_box` decides what it means.
    pub fn send_to<S: State>(&self, payload: impl Any + Send) {
        let envelope = Envelope {
            target: TypeId::of::<S>(),
            origin: None,
            value: Box::new(payload),
        };
        if self.send.send(envelope).is_err() {
            log::warn!("Update for {} dropped: context is gone", type_name::<S>());
        }
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater").finish_non_exhaustive()
    }
}

/// Updater handed to a command task.
///
/// Publishes only while its task is the latest flush of the command and has
/// not been cancelled. The context re-checks on apply, so a result raced past
/// this check by a newer flush is still dropped.
#[derive(Clone)]
pub struct LatestOnlyUpdater {
    send: Sender<Envelope>,
    task: TaskId,
    latest: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl LatestOnlyUpdater {
    pub(crate) fn new(
        send: Sender<Envelope>,
        task: TaskId,
        latest: Arc<AtomicU64>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            send,
            task,
            latest,
            cancel,
        }
    }

    /// The task this updater publishes for.
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled() && self.latest.load(Ordering::Acquire) == self.task.generation()
    }

    pub fn set<T: State + Send>(&self, value: T) {
        self.send_to::<T>(value);
    }

    pub fn send_to<S: State>(&self, payload: impl Any + Send) {
        if !self.is_current() {
            log::debug!(
                "Stale update for {} from generation {} discarded",
                type_name::<S>(),
                self.task.generation()
            );
            return;
        }

        let envelope = Envelope {
            target: TypeId::of::<S>(),
            origin: Some(self.task),
            value: Box::new(payload),
        };
        if self.send.send(envelope).is_err() {
            log::warn!("Update for {} dropped: context is gone", type_name::<S>());
        }
    }
}

impl std::fmt::Debug for LatestOnlyUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatestOnlyUpdater")
            .field("task", &self.task)
            .field("current", &self.is_current())
            .finish()
    }
}
