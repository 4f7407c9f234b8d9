//! Row operations of the producing asset table.
//!
//! "Show Details" only moves the navigation target. "Request I-RECs" runs a
//! chain of checks against the current user and the ledger; the first failing
//! check becomes an error notification, and only a request that passes every
//! check opens the [`RequestIrecsModal`](super::RequestIrecsModal).

use std::any::Any;

use origin_states::{
    CancellationToken, Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater, State,
    state_assign_impl,
};
use thiserror::Error;

use super::modal::RequestIrecsModal;
use super::props::AssetTableProps;
use crate::model::{Address, AssetId, ProducingAsset, Role};
use crate::notification::{Notification, Notifications};
use crate::services::{LookupError, OriginServices};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOperation {
    ShowDetails,
    RequestIrecs,
}

impl RowOperation {
    pub const ALL: [Self; 2] = [Self::ShowDetails, Self::RequestIrecs];

    pub fn label(self) -> &'static str {
        match self {
            Self::ShowDetails => "Show Details",
            Self::RequestIrecs => "Request I-RECs",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.label() == label)
    }
}

pub fn detail_view_path(base_url: &str, asset: AssetId) -> String {
    format!("/{base_url}/assets/producing_detail_view/{asset}")
}

/// Where the embedding router should go next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub target: Option<String>,
}

impl State for NavigationState {
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

/// Row the last action was invoked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowActionInput {
    pub asset_id: Option<AssetId>,
}

impl State for RowActionInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(*self))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

/// Why an I-REC request was refused. Display strings are shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestRejection {
    #[error("Asset {0} not found.")]
    AssetNotFound(AssetId),

    #[error("You need to own the asset to request I-RECs.")]
    NotOwner,

    #[error("You need to have Asset Manager role to request I-RECs.")]
    MissingRole,

    #[error("There are no smart meter reads for this asset.")]
    NoMeterReads,

    #[error("You have already requested certificates for all smart meter reads for this asset.")]
    AllReadsRequested,

    #[error("Could not check smart meter reads: {0}")]
    Lookup(#[from] LookupError),
}

/// A request that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrecRequest {
    pub asset: ProducingAsset,
    pub acting_as: Address,
    pub meter_reads: usize,
    pub requested_reads: usize,
}

impl IrecRequest {
    pub fn unrequested_reads(&self) -> usize {
        self.meter_reads.saturating_sub(self.requested_reads)
    }
}

/// Run the request checks in order; the first failure wins.
pub async fn validate_irec_request(
    asset_id: AssetId,
    props: &AssetTableProps,
    services: &OriginServices,
) -> Result<IrecRequest, RequestRejection> {
    let asset = props
        .asset(asset_id)
        .ok_or(RequestRejection::AssetNotFound(asset_id))?;
    let user = &props.current_user;

    if !asset.is_owned_by(&user.id) {
        return Err(RequestRejection::NotOwner);
    }
    if !user.is_role(Role::AssetManager) {
        return Err(RequestRejection::MissingRole);
    }

    let meter_reads = services.meter_reads.smart_meter_reads(asset_id).await?.len();
    if meter_reads == 0 {
        return Err(RequestRejection::NoMeterReads);
    }

    let requested_reads = services
        .certificate_logic
        .requested_reads_len(asset_id)
        .await?;
    if requested_reads >= meter_reads {
        return Err(RequestRejection::AllReadsRequested);
    }

    Ok(IrecRequest {
        asset: asset.clone(),
        acting_as: user.id.clone(),
        meter_reads,
        requested_reads,
    })
}

/// Validates the row in [`RowActionInput`] and opens the modal on success.
pub struct RequestIrecsCommand;

impl Command for RequestIrecsCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let asset_id = snap
            .try_state::<RowActionInput>()
            .ok()
            .and_then(|input| input.asset_id);
        let props = snap.try_state::<AssetTableProps>().cloned();
        let services = snap.try_state::<OriginServices>().cloned();

        Box::pin(async move {
            let (Some(asset_id), Ok(props), Ok(services)) = (asset_id, props, services) else {
                log::warn!("RequestIrecsCommand ran without a row, table props or services");
                return;
            };

            let outcome = tokio::select! {
                () = cancel.cancelled() => return,
                outcome = validate_irec_request(asset_id, &props, &services) => outcome,
            };

            match outcome {
                Ok(request) => {
                    log::info!(
                        "Opening I-REC request for asset {asset_id}: {} of {} reads unrequested",
                        request.unrequested_reads(),
                        request.meter_reads
                    );
                    updater.set(RequestIrecsModal::open(request, updater.task_id()));
                }
                Err(rejection) => {
                    updater.send_to::<Notifications>(Notification::error(rejection.to_string()));
                }
            }
        })
    }
}
