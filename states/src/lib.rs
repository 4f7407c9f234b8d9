//! Typed state container for view-models.
//!
//! - [`State`]: values owned by the [`StateCtx`] thread, keyed by type.
//! - [`Command`]: manual-only async work, spawned on flush, fed a
//!   [`CommandSnapshot`] and publishing through a [`LatestOnlyUpdater`].
//! - Overlapping flushes of one command supersede each other: the older task
//!   is cancelled via its [`TaskHandle`] and its late results are dropped.

mod command;
mod ctx;
mod error;
mod snapshot;
mod state;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use ctx::StateCtx;
pub use error::Error;
pub use snapshot::CommandSnapshot;
pub use state::{State, state_assign_impl};
pub use task::{TaskHandle, TaskId};
pub use tokio_util::sync::CancellationToken;
pub use updater::{LatestOnlyUpdater, Updater};
