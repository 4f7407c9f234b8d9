use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flume::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::updater::Envelope;
use crate::{
    Command, CommandSnapshot, Error, LatestOnlyUpdater, State, TaskHandle, TaskId, Updater,
};

/// Owner of all states and commands of one view.
///
/// The context lives on a single thread. Commands run as tokio tasks and talk
/// back only through queued updates, which `sync_updates` applies here.
///
/// Overlapping flushes of the same command follow a supersede policy: the
/// older task is cancelled and anything it publishes afterwards is dropped.
pub struct StateCtx {
    states: BTreeMap<TypeId, Box<dyn State>>,
    commands: BTreeMap<TypeId, Arc<dyn Command>>,
    queue: VecDeque<TypeId>,
    generations: BTreeMap<TypeId, Arc<AtomicU64>>,
    in_flight: BTreeMap<TypeId, TaskHandle>,
    tasks: JoinSet<()>,
    send: Sender<Envelope>,
    recv: Receiver<Envelope>,
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("states", &self.states.len())
            .field("commands", &self.commands.len())
            .field("queued", &self.queue.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            states: BTreeMap::new(),
            commands: BTreeMap::new(),
            queue: VecDeque::new(),
            generations: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            tasks: JoinSet::new(),
            send,
            recv,
        }
    }

    // =====================
    // States
    // =====================

    /// Register `state`, replacing any previous value of the same type.
    pub fn add_state<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), Box::new(state));
    }

    pub fn has_state<T: State>(&self) -> bool {
        self.states.contains_key(&TypeId::of::<T>())
    }

    pub fn try_state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
            .ok_or_else(|| Error::state_not_found(type_name::<T>()))
    }

    /// # Panics
    ///
    /// Panics if `T` was never registered with [`StateCtx::add_state`].
    pub fn state<T: State>(&self) -> &T {
        match self.try_state::<T>() {
            Ok(state) => state,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Panics
    ///
    /// Panics if `T` was never registered with [`StateCtx::add_state`].
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        match self
            .states
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
        {
            Some(state) => state,
            None => panic!("{}", Error::state_not_found(type_name::<T>())),
        }
    }

    /// Mutate a state in place on the context thread.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        f(self.state_mut::<T>());
    }

    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    /// Apply every queued update. Returns how many were applied.
    ///
    /// Updates from a task that has since been superseded or cancelled are
    /// dropped here, even if they were queued before the newer flush.
    pub fn sync_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.recv.try_recv() {
            if let Some(origin) = envelope.origin
                && !self.is_current(origin)
            {
                log::debug!(
                    "Discarding update from superseded task generation {}",
                    origin.generation()
                );
                continue;
            }

            match self.states.get_mut(&envelope.target) {
                Some(state) => {
                    state.assign_box(envelope.value);
                    applied += 1;
                }
                None => log::warn!("Update routed to an unregistered state was dropped"),
            }
        }
        applied
    }

    fn is_current(&self, task: TaskId) -> bool {
        let latest = self
            .generations
            .get(&task.type_id())
            .map(|generation| generation.load(Ordering::Acquire));
        let cancelled = self
            .in_flight
            .get(&task.type_id())
            .is_some_and(|handle| handle.id() == task && handle.is_cancelled());

        latest == Some(task.generation()) && !cancelled
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snap = CommandSnapshot::new();
        for (id, state) in &self.states {
            if let Some(cloned) = state.snapshot() {
                snap.insert_cloned(*id, cloned);
            }
        }
        snap
    }

    // =====================
    // Commands
    // =====================

    pub fn record_command<C: Command>(&mut self, command: C) {
        let id = TypeId::of::<C>();
        self.commands.insert(id, Arc::new(command));
        self.generations.entry(id).or_default();
    }

    pub fn has_command<C: Command>(&self) -> bool {
        self.commands.contains_key(&TypeId::of::<C>())
    }

    pub fn enqueue_command<C: Command>(&mut self) {
        if !self.has_command::<C>() {
            log::warn!("{}", Error::command_not_found(type_name::<C>()));
            return;
        }
        self.queue.push_back(TypeId::of::<C>());
    }

    /// Enqueue and flush immediately.
    pub fn dispatch<C: Command>(&mut self) {
        self.enqueue_command::<C>();
        self.flush_commands();
    }

    /// Spawn every queued command. Must be called inside a tokio runtime.
    pub fn flush_commands(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            let Some(command) = self.commands.get(&id).cloned() else {
                continue;
            };

            let snapshot = self.snapshot();
            let latest = Arc::clone(self.generations.entry(id).or_default());
            let generation = latest.fetch_add(1, Ordering::AcqRel) + 1;

            if let Some(previous) = self.in_flight.remove(&id) {
                log::debug!(
                    "Generation {} superseded by {}",
                    previous.id().generation(),
                    generation
                );
                previous.cancel();
            }

            let token = CancellationToken::new();
            let task_id = TaskId::new(id, generation);
            let updater = LatestOnlyUpdater::new(self.send.clone(), task_id, latest, token.clone());

            let future = command.run(snapshot, updater, token.clone());
            self.tasks.spawn(future);
            self.in_flight.insert(id, TaskHandle::new(task_id, token));
        }
    }

    /// Cancel the in-flight task of `C`, if any, and drop its future updates.
    pub fn cancel_command<C: Command>(&mut self) {
        let id = TypeId::of::<C>();
        self.queue.retain(|queued| *queued != id);
        if let Some(generation) = self.generations.get(&id) {
            generation.fetch_add(1, Ordering::AcqRel);
        }
        if let Some(handle) = self.in_flight.remove(&id) {
            log::debug!("Cancelled generation {}", handle.id().generation());
            handle.cancel();
        }
    }

    // =====================
    // Tasks
    // =====================

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// Await every spawned task, applying updates as each one finishes.
    pub async fn wait_for_tasks(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                log::warn!("Command task failed: {err}");
            }
            self.sync_updates();
        }
        self.sync_updates();
    }

    /// Sync, flush queued commands, and wait until every task has finished.
    pub async fn flush_and_wait(&mut self) {
        self.sync_updates();
        self.flush_commands();
        self.wait_for_tasks().await;
    }

    /// Cancel everything in flight and discard whatever is still queued.
    pub async fn shutdown(&mut self) {
        for generation in self.generations.values() {
            generation.fetch_add(1, Ordering::AcqRel);
        }
        for handle in self.in_flight.values() {
            handle.cancel();
        }
        self.in_flight.clear();
        self.queue.clear();
        self.tasks.shutdown().await;

        let discarded = self.recv.drain().count();
        if discarded > 0 {
            log::debug!("Discarded {discarded} updates on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandFuture, state_assign_impl};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, Default)]
    struct Input {
        value: u32,
        gate: Option<Arc<Notify>>,
        watch_cancel: bool,
    }

    impl State for Input {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
            Some(Box::new(self.clone()))
        }

        fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
            state_assign_impl(self, new_self);
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct Output {
        value: u32,
        cancelled: bool,
    }

    impl State for Output {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
            state_assign_impl(self, new_self);
        }
    }

    /// Appends instead of replacing.
    #[derive(Debug, Default)]
    struct Log(Vec<String>);

    impl State for Log {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
            if let Ok(line) = new_self.downcast::<String>() {
                self.0.push(*line);
            }
        }
    }

    /// Copies `Input.value` into `Output`, optionally parked on `Input.gate` first.
    struct Publish;

    impl Command for Publish {
        fn run(
            &self,
            snap: CommandSnapshot,
            updater: LatestOnlyUpdater,
            cancel: CancellationToken,
        ) -> CommandFuture {
            let input = snap.state::<Input>().clone();
            Box::pin(async move {
                if let Some(gate) = input.gate {
                    if input.watch_cancel {
                        tokio::select! {
                            () = cancel.cancelled() => return,
                            () = gate.notified() => {}
                        }
                    } else {
                        gate.notified().await;
                    }
                }
                updater.set(Output {
                    value: input.value,
                    cancelled: cancel.is_cancelled(),
                });
            })
        }
    }

    fn setup_ctx() -> StateCtx {
        let mut ctx = StateCtx::new();
        ctx.add_state(Input::default());
        ctx.add_state(Output::default());
        ctx.add_state(Log::default());
        ctx.record_command(Publish);
        ctx
    }

    #[test]
    fn update_mutates_in_place() {
        let mut ctx = setup_ctx();

        ctx.update::<Input>(|input| input.value = 5);

        assert_eq!(ctx.state::<Input>().value, 5, "update applies immediately");
    }

    #[test]
    fn unregistered_state_is_an_error() {
        let ctx = StateCtx::new();

        assert!(ctx.try_state::<Output>().is_err(), "unregistered state lookup fails");
        assert!(!ctx.has_state::<Output>(), "has_state reports the missing state");
    }

    #[test]
    fn updater_changes_apply_on_sync() {
        let mut ctx = setup_ctx();
        let updater = ctx.updater();

        updater.set(Output {
            value: 3,
            cancelled: false,
        });
        assert_eq!(ctx.state::<Output>().value, 0, "queued update is not applied before sync");

        assert_eq!(ctx.sync_updates(), 1, "one update applied");
        assert_eq!(ctx.state::<Output>().value, 3, "synced value is visible");
    }

    #[test]
    fn send_to_routes_payload_to_target_state() {
        let mut ctx = setup_ctx();
        let updater = ctx.updater();

        updater.send_to::<Log>(String::from("first"));
        updater.send_to::<Log>(String::from("second"));
        ctx.sync_updates();

        assert_eq!(ctx.state::<Log>().0, vec!["first", "second"], "payloads append in send order");
    }

    #[tokio::test]
    async fn dispatched_command_publishes_result() {
        let mut ctx = setup_ctx();
        ctx.update::<Input>(|input| input.value = 11);

        ctx.enqueue_command::<Publish>();
        ctx.flush_and_wait().await;

        assert_eq!(ctx.state::<Output>().value, 11, "command result committed");
        assert_eq!(ctx.task_count(), 0, "finished task is reaped");
    }

    #[tokio::test]
    async fn newer_flush_supersedes_in_flight_task() {
        let mut ctx = setup_ctx();
        let gate = Arc::new(Notify::new());

        ctx.update::<Input>(|input| {
            input.value = 1;
            input.gate = Some(Arc::clone(&gate));
        });
        ctx.dispatch::<Publish>();

        ctx.update::<Input>(|input| {
            input.value = 2;
            input.gate = None;
        });
        ctx.dispatch::<Publish>();

        // The first task finishes last and ignores its token; its update must still lose.
        gate.notify_one();
        ctx.wait_for_tasks().await;

        assert_eq!(
            ctx.state::<Output>(),
            &Output {
                value: 2,
                cancelled: false
            },
            "only the newer flush commits"
        );
    }

    #[tokio::test]
    async fn stale_update_queued_before_newer_flush_is_dropped() {
        let mut ctx = setup_ctx();
        ctx.update::<Input>(|input| input.value = 1);
        ctx.dispatch::<Publish>();

        // Let the first task publish, but do not sync yet.
        tokio::task::yield_now().await;
        while ctx.task_count() > 0 {
            let _joined = ctx.task_set_mut().join_next().await;
        }

        let gate = Arc::new(Notify::new());
        ctx.update::<Input>(|input| {
            input.value = 2;
            input.gate = Some(Arc::clone(&gate));
        });
        ctx.dispatch::<Publish>();

        ctx.sync_updates();
        assert_eq!(
            ctx.state::<Output>().value,
            0,
            "stale update from the first generation is dropped"
        );

        gate.notify_one();
        ctx.wait_for_tasks().await;
        assert_eq!(ctx.state::<Output>().value, 2, "second generation commits");
    }

    #[tokio::test]
    async fn cancel_command_discards_result() {
        let mut ctx = setup_ctx();
        let gate = Arc::new(Notify::new());
        ctx.update::<Input>(|input| {
            input.value = 9;
            input.gate = Some(Arc::clone(&gate));
        });
        ctx.dispatch::<Publish>();

        ctx.cancel_command::<Publish>();
        gate.notify_one();
        ctx.wait_for_tasks().await;

        assert_eq!(ctx.state::<Output>(), &Output::default(), "cancelled command commits nothing");
    }

    #[tokio::test]
    async fn cooperative_task_stops_on_cancel() {
        let mut ctx = setup_ctx();
        ctx.update::<Input>(|input| {
            input.value = 4;
            input.gate = Some(Arc::new(Notify::new()));
            input.watch_cancel = true;
        });
        ctx.dispatch::<Publish>();

        ctx.cancel_command::<Publish>();
        ctx.wait_for_tasks().await;

        assert_eq!(ctx.state::<Output>().value, 0, "cancelled task publishes nothing");
    }

    #[tokio::test]
    async fn shutdown_clears_tasks_and_pending_updates() {
        let mut ctx = setup_ctx();
        ctx.update::<Input>(|input| {
            input.gate = Some(Arc::new(Notify::new()));
        });
        ctx.dispatch::<Publish>();
        ctx.updater().send_to::<Log>(String::from("pending"));

        ctx.shutdown().await;

        assert_eq!(ctx.task_count(), 0, "shutdown aborts every task");
        assert_eq!(ctx.sync_updates(), 0, "pending updates are discarded");
        assert!(ctx.state::<Log>().0.is_empty(), "log never received the pending line");
    }

    #[test]
    fn enqueue_of_unknown_command_is_ignored() {
        let mut ctx = StateCtx::new();

        ctx.enqueue_command::<Publish>();
        ctx.flush_commands();

        assert_eq!(ctx.task_count(), 0, "unknown command spawns nothing");
    }
}
