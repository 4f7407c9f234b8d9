//! Producing asset table: data provider, row actions and the I-REC modal.
//!
//! Everything lives in one [`StateCtx`] built by [`build_asset_table_ctx`].
//! The functions here are what the embedding view calls on user input; each
//! one touches states on the context thread and dispatches commands for the
//! asynchronous parts.

mod actions;
mod enrich;
mod modal;
mod props;
mod table;

use std::sync::Arc;

use origin_states::StateCtx;

use crate::config::BusinessConfig;
use crate::model::{AssetId, ProducingAsset};
use crate::notification::Notifications;
use crate::pagination::{PageState, PaginatedLoader};
use crate::services::OriginServices;

pub use actions::{
    IrecRequest, NavigationState, RequestIrecsCommand, RequestRejection, RowActionInput,
    RowOperation, detail_view_path, validate_irec_request,
};
pub use enrich::{EnrichedProducingAsset, enrich_producing_assets, not_sold_certificates};
pub use modal::{ConfirmIrecsRequestCommand, RequestIrecsModal};
pub use props::AssetTableProps;
pub use table::{
    ASSET_TABLE_COLUMNS, AssetRow, ColumnFilter, FilterProperty, ProducingAssetTable,
    TableColumn, TableFooter, table_footer,
};

pub type ProducingAssetLoader = PaginatedLoader<ProducingAssetTable>;
pub type ProducingAssetPage = PageState<ProducingAssetTable>;

pub fn build_asset_table_ctx(
    config: &BusinessConfig,
    props: AssetTableProps,
    services: OriginServices,
) -> StateCtx {
    let mut ctx = StateCtx::new();
    ctx.add_state(config.clone());
    ctx.add_state(props);
    ctx.add_state(services);
    ctx.add_state(Notifications::default());
    ctx.add_state(NavigationState::default());
    ctx.add_state(RowActionInput::default());
    ctx.add_state(RequestIrecsModal::default());

    ProducingAssetLoader::register(&mut ctx, config.page_size);
    ctx.record_command(RequestIrecsCommand);
    ctx.record_command(ConfirmIrecsRequestCommand);
    ctx
}

/// Start showing the table: loads page 1.
pub fn mount(ctx: &mut StateCtx) {
    ProducingAssetLoader::activate(ctx);
}

/// Stop showing the table. Nothing in flight commits afterwards.
pub fn unmount(ctx: &mut StateCtx) {
    ProducingAssetLoader::deactivate(ctx);
    ctx.cancel_command::<RequestIrecsCommand>();
    ctx.cancel_command::<ConfirmIrecsRequestCommand>();
}

pub fn page(ctx: &StateCtx) -> &ProducingAssetPage {
    ProducingAssetLoader::state(ctx)
}

pub fn operation_clicked(ctx: &mut StateCtx, operation: RowOperation, asset: AssetId) {
    log::debug!("{} clicked on asset {asset}", operation.label());
    match operation {
        RowOperation::ShowDetails => show_details(ctx, asset),
        RowOperation::RequestIrecs => request_irecs(ctx, asset),
    }
}

pub fn show_details(ctx: &mut StateCtx, asset: AssetId) {
    let target = detail_view_path(&ctx.state::<AssetTableProps>().base_url, asset);
    ctx.update::<NavigationState>(|navigation| navigation.target = Some(target));
}

pub fn request_irecs(ctx: &mut StateCtx, asset: AssetId) {
    ctx.update::<RowActionInput>(|input| input.asset_id = Some(asset));
    ctx.dispatch::<RequestIrecsCommand>();
}

pub fn hide_request_irecs_modal(ctx: &mut StateCtx) {
    ctx.update::<RequestIrecsModal>(|modal| *modal = RequestIrecsModal::default());
}

pub fn confirm_request_irecs(ctx: &mut StateCtx) {
    if !ctx.state::<RequestIrecsModal>().is_open() {
        log::warn!("Confirm clicked without an open I-REC request");
        return;
    }
    ctx.dispatch::<ConfirmIrecsRequestCommand>();
}

/// Toggle the "only my assets" scope and reload the current page.
pub fn switch_to_organization(ctx: &mut StateCtx, enabled: bool) {
    if ctx.state::<AssetTableProps>().switched_to_organization == enabled {
        return;
    }
    ctx.update::<AssetTableProps>(|props| props.switched_to_organization = enabled);
    if page(ctx).active {
        ProducingAssetLoader::reload(ctx);
    }
}

/// Replace the asset list. A different list reloads page 1.
pub fn replace_producing_assets(ctx: &mut StateCtx, assets: Arc<Vec<ProducingAsset>>) {
    if Arc::ptr_eq(&ctx.state::<AssetTableProps>().producing_assets, &assets) {
        return;
    }
    ctx.update::<AssetTableProps>(|props| props.producing_assets = assets);
    if page(ctx).active {
        ProducingAssetLoader::request_page(ctx, 1, Vec::new());
    }
}
