//! Resolve the detail view path of an asset.

use anyhow::{Context as _, Result};
use origin_business::AssetId;
use origin_business::producing_assets::{self, AssetTableProps, NavigationState, RowOperation};
use origin_states::StateCtx;
use tracing::{instrument, warn};

use crate::output::Output;

#[instrument(skip_all, name = "details", fields(id))]
pub fn run_details(mut ctx: StateCtx, id: u64) -> Result<()> {
    let out = Output::new();
    let asset = AssetId(id);

    if ctx.state::<AssetTableProps>().asset(asset).is_none() {
        warn!("Asset {asset} is not in the ledger");
    }

    producing_assets::operation_clicked(&mut ctx, RowOperation::ShowDetails, asset);
    let target = ctx
        .state::<NavigationState>()
        .target
        .clone()
        .context("Show Details did not set a navigation target")?;

    out.print(target);
    Ok(())
}
