use std::any::Any;

use origin_states::{
    CancellationToken, Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater, State, TaskId,
    state_assign_impl,
};

use super::actions::IrecRequest;
use crate::notification::{Notification, Notifications};
use crate::services::OriginServices;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenRequest {
    request: IrecRequest,
    opened_by: TaskId,
}

/// Confirmation dialog for an I-REC request.
///
/// Each open is tagged with the task that validated it, so a confirmation that
/// finishes after the user moved on cannot close a newer dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIrecsModal {
    open: Option<OpenRequest>,
}

impl RequestIrecsModal {
    pub fn open(request: IrecRequest, opened_by: TaskId) -> Self {
        Self {
            open: Some(OpenRequest { request, opened_by }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn request(&self) -> Option<&IrecRequest> {
        self.open.as_ref().map(|open| &open.request)
    }

    fn close_if_opened_by(&mut self, task: TaskId) {
        let open = self
            .open
            .as_ref()
            .map(|open| (open.opened_by, open.request.asset.id));
        match open {
            Some((opened_by, _)) if opened_by == task => self.open = None,
            Some((_, asset)) => log::debug!(
                "Keeping the modal for asset {asset}: it was reopened after the confirmed request"
            ),
            None => {}
        }
    }
}

/// The request opened by this task went through.
#[derive(Debug)]
struct RequestFulfilled(TaskId);

impl State for RequestIrecsModal {
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
        match new_self.downcast::<RequestFulfilled>() {
            Ok(fulfilled) => self.close_if_opened_by(fulfilled.0),
            Err(other) => state_assign_impl(self, other),
        }
    }
}

/// Requests certificates for every unrequested read of the open modal's asset.
///
/// Closes the modal on success, unless it was reopened in the meantime. On
/// failure the modal stays open so the user can retry or dismiss it. Nothing
/// commits once the command is cancelled.
pub struct ConfirmIrecsRequestCommand;

impl Command for ConfirmIrecsRequestCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let open = snap
            .try_state::<RequestIrecsModal>()
            .ok()
            .and_then(|modal| modal.open.clone());
        let services = snap.try_state::<OriginServices>().cloned();

        Box::pin(async move {
            let Some(OpenRequest { request, opened_by }) = open else {
                log::warn!("I-REC confirmation without an open request");
                return;
            };
            let Ok(services) = services else {
                log::warn!("I-REC confirmation without services");
                return;
            };

            let asset = request.asset.id;
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = services.certificate_logic.request_certificates(
                    asset,
                    request.meter_reads,
                    &request.acting_as,
                ) => result,
            };

            match result {
                Ok(()) => {
                    updater.send_to::<Notifications>(Notification::info(format!(
                        "Requested I-RECs for {} smart meter reads of asset {asset}.",
                        request.unrequested_reads()
                    )));
                    updater.send_to::<RequestIrecsModal>(RequestFulfilled(opened_by));
                }
                Err(err) => {
                    updater.send_to::<Notifications>(Notification::error(format!(
                        "Could not request I-RECs for asset {asset}: {err}"
                    )));
                }
            }
        })
    }
}
