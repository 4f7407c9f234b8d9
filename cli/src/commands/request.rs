//! Request I-RECs for an asset through the confirmation modal.

use anyhow::{Context as _, Result, bail};
use inquire::Confirm;
use origin_business::AssetId;
use origin_business::producing_assets::{self, RequestIrecsModal, RowOperation};
use origin_states::StateCtx;
use tracing::instrument;

use crate::context::{await_pending_tasks, print_notifications};
use crate::output::Output;

#[instrument(skip_all, name = "request", fields(id, yes))]
pub async fn run_request(mut ctx: StateCtx, id: u64, yes: bool) -> Result<()> {
    let out = Output::new();

    producing_assets::operation_clicked(&mut ctx, RowOperation::RequestIrecs, AssetId(id));
    await_pending_tasks(&mut ctx).await;

    if print_notifications(&mut ctx, &out) {
        ctx.shutdown().await;
        bail!("I-REC request for asset {id} was rejected");
    }

    let Some(request) = ctx.state::<RequestIrecsModal>().request().cloned() else {
        ctx.shutdown().await;
        bail!("I-REC request for asset {id} did not complete");
    };

    out.header(format!("Request I-RECs for asset {}", request.asset.id));
    out.labeled("Facility", &request.asset.off_chain_properties.facility_name);
    out.labeled("Acting as", &request.acting_as);
    out.labeled("Smart meter reads", request.meter_reads);
    out.labeled("Already requested", request.requested_reads);

    let confirmed = yes
        || Confirm::new(&format!(
            "Request I-RECs for {} smart meter read(s)?",
            request.unrequested_reads()
        ))
        .with_default(false)
        .prompt()
        .context("Failed to read confirmation")?;

    if !confirmed {
        producing_assets::hide_request_irecs_modal(&mut ctx);
        out.dim("Cancelled.");
        ctx.shutdown().await;
        return Ok(());
    }

    producing_assets::confirm_request_irecs(&mut ctx);
    await_pending_tasks(&mut ctx).await;
    let failed = print_notifications(&mut ctx, &out);

    ctx.shutdown().await;
    if failed {
        bail!("I-REC request for asset {id} failed");
    }
    Ok(())
}
