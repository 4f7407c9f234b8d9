use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, LatestOnlyUpdater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Manual-only unit of work, run when dispatched.
///
/// `run` is called synchronously at flush time. Read everything needed from
/// `snap` there, then move owned values into the returned future. Results go
/// out through `updater`; `cancel` fires when the task is superseded by a newer
/// flush of the same command, cancelled explicitly, or the context shuts down.
pub trait Command: Any + Send + Sync {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture;
}
