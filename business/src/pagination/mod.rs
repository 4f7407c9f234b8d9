//! Generic paginated loading.
//!
//! A [`PaginatedLoader`] owns three things in a [`StateCtx`]: the committed
//! [`PageState`], the pending [`PageRequest`] and the [`LoadPageCommand`] that
//! turns one into the other through a [`PageFetcher`].
//!
//! Only the most recent request may commit. A newer request supersedes the
//! in-flight one, and deactivating cancels it outright.

mod page;

use std::marker::PhantomData;

use async_trait::async_trait;
use origin_states::{
    CancellationToken, Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater, StateCtx,
};
use thiserror::Error;
use ustr::Ustr;

use crate::notification::{Notification, Notifications};
use crate::services::LookupError;

pub use page::{
    DEFAULT_PAGE_SIZE, PageData, PageFilter, PageParams, PageRequest, PageState, PageStatus,
    offset_for,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Unknown filter property `{0}`")]
    UnknownFilter(Ustr),

    #[error("Page context unavailable: {0}")]
    Context(#[from] origin_states::Error),

    #[error("Page task failed: {0}")]
    Task(String),
}

/// Source of rows for one kind of table.
///
/// `fetch_page` must return at most `params.page_size` rows; anything beyond
/// is cut off before commit.
#[async_trait]
pub trait PageFetcher: Send + Sync + Sized + 'static {
    type Row: Clone + std::fmt::Debug + Send + Sync + 'static;

    /// Build the fetcher from the states visible to the load command.
    fn from_snapshot(snap: &CommandSnapshot) -> Result<Self, LoadError>;

    async fn fetch_page(&self, params: PageParams) -> Result<PageData<Self::Row>, LoadError>;
}

/// Loads `PageRequest<F>` into `PageState<F>`.
pub struct LoadPageCommand<F>(PhantomData<fn() -> F>);

impl<F> Default for LoadPageCommand<F> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<F: PageFetcher> LoadPageCommand<F> {
    fn prepare(snap: &CommandSnapshot) -> Result<(PageRequest<F>, PageState<F>, F), LoadError> {
        let request = snap.try_state::<PageRequest<F>>()?.clone();
        let previous = snap.try_state::<PageState<F>>()?.clone();
        let fetcher = F::from_snapshot(snap)?;
        Ok((request, previous, fetcher))
    }
}

impl<F: PageFetcher> Command for LoadPageCommand<F> {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let prepared = Self::prepare(&snap);

        Box::pin(async move {
            let (request, previous, fetcher) = match prepared {
                Ok(prepared) => prepared,
                Err(err) => {
                    log::error!("Cannot load page: {err}");
                    updater.send_to::<Notifications>(Notification::error(err.to_string()));
                    return;
                }
            };

            let page = request.page.max(1);
            let params = PageParams {
                page_size: previous.page_size,
                offset: offset_for(page, previous.page_size),
                filters: request.filters,
            };
            log::debug!(
                "Loading page {page} (offset {}, size {}, {} filters)",
                params.offset,
                params.page_size,
                params.filters.len()
            );

            let result = tokio::select! {
                () = cancel.cancelled() => {
                    log::debug!("Load of page {page} cancelled");
                    return;
                }
                result = fetcher.fetch_page(params) => result,
            };

            match result {
                Ok(data) => updater.set(previous.loaded(page, data)),
                Err(err) => {
                    log::warn!("Load of page {page} failed: {err}");
                    updater.send_to::<Notifications>(Notification::error(format!(
                        "Could not load page {page}: {err}"
                    )));
                    updater.set(previous.failed(err.to_string()));
                }
            }
        })
    }
}

/// Entry points for driving a paginated table of `F` rows.
pub struct PaginatedLoader<F>(PhantomData<fn() -> F>);

impl<F: PageFetcher> PaginatedLoader<F> {
    /// Register the loader's states and command. The loader starts inactive.
    pub fn register(ctx: &mut StateCtx, page_size: usize) {
        ctx.add_state(PageState::<F>::new(page_size));
        ctx.add_state(PageRequest::<F>::default());
        if !ctx.has_state::<Notifications>() {
            ctx.add_state(Notifications::default());
        }
        ctx.record_command(LoadPageCommand::<F>::default());
    }

    pub fn state(ctx: &StateCtx) -> &PageState<F> {
        ctx.state::<PageState<F>>()
    }

    /// Start accepting results and load page 1 without filters.
    pub fn activate(ctx: &mut StateCtx) {
        ctx.update::<PageState<F>>(|state| {
            *state = PageState::new(state.page_size);
            state.active = true;
        });
        Self::request_page(ctx, 1, Vec::new());
    }

    /// Load `page` with `filters`, superseding any load still in flight.
    ///
    /// Ignored while the loader is inactive.
    pub fn request_page(ctx: &mut StateCtx, page: u32, filters: Vec<PageFilter>) {
        if !Self::state(ctx).active {
            log::warn!("Page {page} requested on an inactive loader; ignoring");
            return;
        }

        ctx.update::<PageRequest<F>>(|request| *request = PageRequest::new(page, filters));
        ctx.update::<PageState<F>>(|state| state.status = PageStatus::Loading);
        ctx.dispatch::<LoadPageCommand<F>>();
    }

    /// Request the last requested page again with the same filters.
    pub fn reload(ctx: &mut StateCtx) {
        let request = ctx.state::<PageRequest<F>>().clone();
        Self::request_page(ctx, request.page, request.filters);
    }

    /// Stop accepting results. An in-flight load is cancelled and never commits.
    pub fn deactivate(ctx: &mut StateCtx) {
        ctx.cancel_command::<LoadPageCommand<F>>();
        ctx.update::<PageState<F>>(|state| *state = PageState::new(state.page_size));
        ctx.update::<PageRequest<F>>(|request| *request = PageRequest::default());
    }
}
