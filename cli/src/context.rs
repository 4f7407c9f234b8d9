//! State context setup and task management for one CLI invocation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use origin_business::producing_assets::{AssetTableProps, build_asset_table_ctx};
use origin_business::{Address, BusinessConfig, InMemoryLedger, Notifications, User};
use origin_states::StateCtx;
use tracing::{instrument, warn};

use crate::cli::SessionArgs;
use crate::output::Output;

#[instrument(skip_all, name = "load_ledger", fields(path = %path.display()))]
pub fn load_ledger(path: &Path) -> Result<Arc<InMemoryLedger>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger {}", path.display()))?;
    let ledger = InMemoryLedger::from_json(&json)
        .with_context(|| format!("Failed to parse ledger {}", path.display()))?;
    Ok(Arc::new(ledger))
}

/// Build the table context for `session`, acting as its user.
///
/// An address the ledger does not know can still browse; it just holds no roles.
pub fn build_session_ctx(session: &SessionArgs, config: &BusinessConfig) -> Result<StateCtx> {
    let ledger = load_ledger(&session.ledger)?;
    let address = Address::new(&session.user);
    let current_user = match ledger.user(&address) {
        Some(user) => user.clone(),
        None => {
            warn!("{address} is not registered in the ledger; continuing without roles");
            User::new(address, "", Vec::new())
        }
    };

    let props = AssetTableProps::new(
        ledger.producing_assets(),
        ledger.certificates(),
        current_user,
        config.base_url.clone(),
    );
    Ok(build_asset_table_ctx(config, props, ledger.into_services()))
}

/// Await every spawned task, applying updates as they land.
#[instrument(skip_all, name = "await_tasks")]
pub async fn await_pending_tasks(ctx: &mut StateCtx) {
    while ctx.task_count() > 0 {
        if ctx.task_set_mut().join_next().await.is_some() {
            ctx.sync_updates();
        }
    }
    ctx.sync_updates();
}

/// Print and clear queued notifications. Returns whether any was an error.
pub fn print_notifications(ctx: &mut StateCtx, out: &Output) -> bool {
    let mut failed = false;
    for notification in ctx.state_mut::<Notifications>().drain() {
        failed |= notification.is_error();
        out.notification(&notification);
    }
    failed
}
