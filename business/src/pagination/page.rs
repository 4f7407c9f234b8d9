use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use origin_states::{State, state_assign_impl};
use ustr::Ustr;

use super::PageFetcher;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Offset of the first row of 1-based `page`. Page 0 is treated as page 1.
pub fn offset_for(page: u32, page_size: usize) -> usize {
    let index = page.max(1) as usize - 1;
    index.saturating_mul(page_size)
}

/// Column filter chosen in the table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFilter {
    pub property: Ustr,
    pub value: String,
}

impl PageFilter {
    pub fn new(property: &str, value: impl Into<String>) -> Self {
        Self {
            property: Ustr::from(property),
            value: value.into(),
        }
    }
}

/// What a fetcher is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    pub page_size: usize,
    pub offset: usize,
    pub filters: Vec<PageFilter>,
}

/// What a fetcher returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageData<R> {
    pub rows: Vec<R>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Committed page of a [`PaginatedLoader`](super::PaginatedLoader).
///
/// Replaced wholesale on every completed fetch; `rows.len() <= page_size`.
pub struct PageState<F: PageFetcher> {
    pub rows: Vec<F::Row>,
    pub page: u32,
    pub page_size: usize,
    pub total: usize,
    pub status: PageStatus,
    pub active: bool,
}

impl<F: PageFetcher> PageState<F> {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            status: PageStatus::Idle,
            active: false,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    pub fn is_loading(&self) -> bool {
        self.status == PageStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn loaded(self, page: u32, data: PageData<F::Row>) -> Self {
        let PageData { mut rows, total } = data;
        if rows.len() > self.page_size {
            log::warn!(
                "Fetcher returned {} rows for a page of {}; truncating",
                rows.len(),
                self.page_size
            );
            rows.truncate(self.page_size);
        }

        Self {
            rows,
            page,
            total,
            status: PageStatus::Loaded,
            ..self
        }
    }

    /// Keeps the last committed rows; only the status changes.
    pub(crate) fn failed(self, message: String) -> Self {
        Self {
            status: PageStatus::Failed(message),
            ..self
        }
    }
}

impl<F: PageFetcher> Default for PageState<F> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl<F: PageFetcher> Clone for PageState<F> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            status: self.status.clone(),
            active: self.active,
        }
    }
}

impl<F: PageFetcher> fmt::Debug for PageState<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageState")
            .field("rows", &self.rows)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("total", &self.total)
            .field("status", &self.status)
            .field("active", &self.active)
            .finish()
    }
}

impl<F: PageFetcher> State for PageState<F> {
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

/// Input of the next load: which page, with which filters.
pub struct PageRequest<F> {
    pub page: u32,
    pub filters: Vec<PageFilter>,
    _fetcher: PhantomData<fn() -> F>,
}

impl<F> PageRequest<F> {
    pub fn new(page: u32, filters: Vec<PageFilter>) -> Self {
        Self {
            page,
            filters,
            _fetcher: PhantomData,
        }
    }
}

impl<F> Default for PageRequest<F> {
    fn default() -> Self {
        Self::new(1, Vec::new())
    }
}

impl<F> Clone for PageRequest<F> {
    fn clone(&self) -> Self {
        Self::new(self.page, self.filters.clone())
    }
}

impl<F> fmt::Debug for PageRequest<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRequest")
            .field("page", &self.page)
            .field("filters", &self.filters)
            .finish()
    }
}

impl<F: PageFetcher> State for PageRequest<F> {
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
