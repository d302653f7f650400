//! resreg list view state: filters, pagination and the list fetch cycle.
//!
//! `ResourceListSync` owns the displayed rows and is the only writer of them.
//! A fetch is split into `begin` (synchronous bookkeeping), the awaited gateway
//! call(s) in [`fetch`], and `complete` (synchronous apply), so overlapping
//! fetches can be driven and observed explicitly.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use resreg_api::{CrudGateway, GatewayError, GatewayResult, ListResponse};
use resreg_core::{ClientConfig, FilterCriteria, FilterField, PageRequest, Resource};
use tracing::{debug, info, warn};

mod filters;
mod pagination;

pub use filters::FilterState;
pub use pagination::{PaginationController, PaginationSupport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSyncOptions {
    pub limit: usize,
    /// Drop completions of fetches superseded by a later dispatch.
    pub discard_stale: bool,
}

impl Default for ListSyncOptions {
    fn default() -> Self { Self { limit: resreg_core::config::DEFAULT_PAGE_LIMIT, discard_stale: false } }
}

impl From<&ClientConfig> for ListSyncOptions {
    fn from(cfg: &ClientConfig) -> Self { Self { limit: cfg.page_limit, discard_stale: cfg.discard_stale } }
}

/// What one list request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: FilterCriteria,
    pub page: Option<PageRequest>,
}

/// Handle for an in-flight fetch, issued by [`ResourceListSync::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    query: ListQuery,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 { self.seq }
    pub fn query(&self) -> &ListQuery { &self.query }
}

/// Result of the network part of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Paged { items: Vec<Resource>, total: u64 },
    Flat { items: Vec<Resource>, fell_back: bool },
}

impl Fetched {
    pub fn items(&self) -> &[Resource] {
        match self {
            Self::Paged { items, .. } | Self::Flat { items, .. } => items,
        }
    }
}

/// Run the list request for `query`, with the one pagination fallback.
///
/// A 404 on the paginated form is retried once without `limit`/`offset`; any
/// response to a request sent without paging is treated as flat.
pub async fn fetch(gateway: &dyn CrudGateway, query: &ListQuery) -> GatewayResult<Fetched> {
    let Some(page) = query.page else {
        let items = gateway.list(&query.filters, None).await?.into_items();
        return Ok(Fetched::Flat { items, fell_back: false });
    };
    match gateway.list(&query.filters, Some(page)).await {
        Ok(ListResponse::Paged { items, total }) => Ok(Fetched::Paged { items, total }),
        Ok(ListResponse::Flat(items)) => Ok(Fetched::Flat { items, fell_back: false }),
        Err(e) if e.is_not_found() => {
            info!("list: paginated form not found; retrying without pagination");
            counter!("list_fallback_total").increment(1);
            let items = gateway.list(&query.filters, None).await?.into_items();
            Ok(Fetched::Flat { items, fell_back: true })
        }
        Err(e) => Err(e),
    }
}

/// Owner of the list view: filters, pagination, rows, loading and error state.
pub struct ResourceListSync {
    gateway: Arc<dyn CrudGateway>,
    opts: ListSyncOptions,
    filters: FilterState,
    pagination: PaginationController,
    rows: Vec<Resource>,
    loading: bool,
    error: Option<String>,
    dispatched: u64,
}

impl ResourceListSync {
    pub fn new(gateway: Arc<dyn CrudGateway>, opts: ListSyncOptions) -> Self {
        Self {
            gateway,
            opts,
            filters: FilterState::new(),
            pagination: PaginationController::new(opts.limit),
            rows: Vec::new(),
            loading: false,
            error: None,
            dispatched: 0,
        }
    }

    pub fn rows(&self) -> &[Resource] { &self.rows }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn filters(&self) -> &FilterState { &self.filters }
    pub fn pagination(&self) -> &PaginationController { &self.pagination }
    pub fn gateway(&self) -> Arc<dyn CrudGateway> { self.gateway.clone() }

    /// Set one filter; the page goes back to 1 since old offsets no longer apply. Does not fetch.
    pub fn set_filter(&mut self, field: FilterField, value: impl Into<String>) {
        self.filters.set(field, value);
        self.pagination.reset();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.pagination.reset();
    }

    pub fn query(&self) -> ListQuery {
        ListQuery { filters: self.filters.criteria().clone(), page: self.pagination.page_request() }
    }

    /// Start a fetch cycle: mark loading, clear the error, snapshot the query.
    pub fn begin(&mut self) -> FetchTicket {
        self.dispatched += 1;
        self.loading = true;
        self.error = None;
        let ticket = FetchTicket { seq: self.dispatched, query: self.query() };
        debug!(seq = ticket.seq, page = ?ticket.query.page, "list: fetch dispatched");
        ticket
    }

    /// Apply a finished fetch. Returns whether the outcome was applied.
    ///
    /// Without `discard_stale` completions apply in arrival order (last write wins).
    /// With it, only the newest dispatched fetch may apply; older ones are dropped.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: GatewayResult<Fetched>) -> bool {
        if self.opts.discard_stale && ticket.seq < self.dispatched {
            debug!(seq = ticket.seq, dispatched = self.dispatched, "list: stale completion dropped");
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(Fetched::Paged { items, total }) => {
                self.pagination.apply_envelope(items.len(), total);
                self.rows = items;
            }
            Ok(Fetched::Flat { items, fell_back }) => {
                if fell_back {
                    info!(items = items.len(), "list: backend does not paginate");
                }
                self.pagination.apply_flat(items.len());
                self.rows = items;
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "list: fetch failed");
                self.error = Some(error_message(&e));
            }
        }
        true
    }

    /// One full fetch cycle. Errors end up in [`Self::error`]; returns true on success.
    pub async fn refresh(&mut self) -> bool {
        let t0 = Instant::now();
        let ticket = self.begin();
        let outcome = fetch(self.gateway.as_ref(), ticket.query()).await;
        let ok = outcome.is_ok();
        self.complete(ticket, outcome);
        info!(ok, rows = self.rows.len(), page = self.pagination.current_page(), took_ms = %t0.elapsed().as_millis(), "list: refresh done");
        ok
    }

    /// Back to page 1 and fetch with the current filters.
    pub async fn apply_filters(&mut self) -> bool {
        self.pagination.reset();
        self.refresh().await
    }

    pub async fn next_page(&mut self) -> bool {
        self.pagination.next();
        self.refresh().await
    }

    /// Jump to a 1-based page and fetch it.
    pub async fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to(page);
        self.refresh().await
    }

    /// On page 1 nothing is fetched and false is returned.
    pub async fn prev_page(&mut self) -> bool {
        if !self.pagination.prev() {
            return false;
        }
        self.refresh().await
    }
}

fn error_message(e: &GatewayError) -> String {
    match e {
        GatewayError::RequestFailed { status } => format!("Error {}", status),
        other => other.to_string(),
    }
}
