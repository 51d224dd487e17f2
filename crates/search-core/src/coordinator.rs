//! Search orchestration.
//!
//! [`SearchCoordinator`] is the only writer of [`SearchState`]. Every request
//! goes through the same cycle:
//!
//! 1. cancel whatever is pending (a debounce timer or an in-flight call),
//! 2. bump the generation counter and mark the state as loading,
//! 3. wait out the debounce delay (filtered and recent searches only),
//! 4. dispatch through the shared [`RateLimiter`],
//! 5. commit the response, but only if no newer request was made meanwhile.
//!
//! Cancellation aborts the superseded task, and commits still compare their
//! generation against the current one, so a response that slips past the
//! abort can never overwrite newer results.

use crate::config::EngineConfig;
use crate::filters::{KEYWORD_SEARCH, RESULTS_PER_PAGE, START_INDEX, SearchFilters};
use crate::history::SearchHistory;
use crate::pagination;
use crate::rate_limit::RateLimiter;
use crate::state::SearchState;
use nvd::{ApiError, ApiResult, QueryParams, VulnerabilityApi, VulnerabilityPage};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

/// How a dispatched request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was committed to the state.
    Applied,
    /// The request failed; the message is also in `SearchState::error`.
    Failed(String),
    /// A newer request replaced this one before it could commit.
    Superseded,
}

/// Handle to one dispatched request.
///
/// Dropping the handle does not cancel the request.
#[derive(Debug)]
pub struct SearchHandle {
    generation: u64,
    task: JoinHandle<SearchOutcome>,
}

impl SearchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> SearchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => SearchOutcome::Superseded,
            Err(e) => {
                error!("search task {} panicked: {}", self.generation, e);
                SearchOutcome::Failed(format!("search task failed: {e}"))
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Request {
    Filtered(QueryParams),
    Recent { days: u32 },
    ById(String),
}

impl Request {
    fn failure_message(&self, err: &ApiError) -> String {
        match self {
            Request::Filtered(_) => format!("Failed to search vulnerabilities: {err}"),
            Request::Recent { days } => {
                format!("Failed to fetch vulnerabilities from the last {days} days: {err}")
            }
            Request::ById(id) => format!("Failed to fetch vulnerability {id}: {err}"),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Filtered(params) => write!(f, "search {params}"),
            Request::Recent { days } => write!(f, "recent (last {days} days)"),
            Request::ById(id) => write!(f, "lookup {id}"),
        }
    }
}

fn not_found_message(id: &str) -> String {
    format!("No vulnerability found with ID {id}")
}

async fn fetch(api: &dyn VulnerabilityApi, request: &Request) -> ApiResult<VulnerabilityPage> {
    match request {
        Request::Filtered(params) => api.search(params).await,
        Request::Recent { days } => api.recent(*days).await,
        Request::ById(id) => api.get_by_id(id).await,
    }
}

/// idle → debouncing → in-flight → idle. A new request arriving in any
/// non-idle state aborts the current task first.
#[derive(Debug)]
enum Pending {
    Idle,
    Debouncing { generation: u64, abort: AbortHandle },
    InFlight { generation: u64, abort: AbortHandle },
}

impl Pending {
    fn cancel(&mut self) {
        match std::mem::replace(self, Pending::Idle) {
            Pending::Idle => {}
            Pending::Debouncing { generation, abort } => {
                debug!("dropping debounced request {}", generation);
                abort.abort();
            }
            Pending::InFlight { generation, abort } => {
                debug!("cancelling in-flight request {}", generation);
                abort.abort();
            }
        }
    }
}

struct Inner {
    filters: SearchFilters,
    /// Payload of the last committed filtered search.
    applied: Option<QueryParams>,
    history: SearchHistory,
    generation: u64,
    pending: Pending,
}

struct Shared {
    api: Arc<dyn VulnerabilityApi>,
    limiter: Arc<RateLimiter>,
    config: EngineConfig,
    inner: Mutex<Inner>,
    state: watch::Sender<SearchState>,
}

impl Shared {
    // Lock order is always `inner` first, then `state`.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(
        self: Arc<Self>,
        generation: u64,
        request: Request,
        debounce: Option<Duration>,
    ) -> SearchOutcome {
        if let Some(delay) = debounce {
            tokio::time::sleep(delay).await;
            if !self.mark_in_flight(generation) {
                return SearchOutcome::Superseded;
            }
        }

        let result = match &request {
            Request::ById(id) if id.is_empty() => Ok(VulnerabilityPage::default()),
            _ => {
                let api = self.api.clone();
                let dispatched = request.clone();
                self.limiter
                    .schedule(move || async move { fetch(api.as_ref(), &dispatched).await })
                    .await
            }
        };

        self.commit(generation, request, result)
    }

    fn mark_in_flight(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.pending = match std::mem::replace(&mut inner.pending, Pending::Idle) {
            Pending::Debouncing { abort, .. } => Pending::InFlight { generation, abort },
            other => other,
        };
        true
    }

    fn commit(
        &self,
        generation: u64,
        request: Request,
        result: ApiResult<VulnerabilityPage>,
    ) -> SearchOutcome {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(
                "discarding response to request {} (current is {})",
                generation, inner.generation
            );
            return SearchOutcome::Superseded;
        }
        inner.pending = Pending::Idle;

        match (request, result) {
            (Request::Filtered(params), Ok(page)) => {
                let page_size = params
                    .get_u32(RESULTS_PER_PAGE)
                    .unwrap_or(self.config.results_per_page);
                let start_index = params.get_u32(START_INDEX).unwrap_or(0);
                info!(
                    "search {} returned {} of {} results",
                    generation,
                    page.vulnerabilities.len(),
                    page.total_results
                );
                self.state
                    .send_modify(|state| state.apply_page(page, start_index, page_size));
                if let Some(keyword) = params.get_str(KEYWORD_SEARCH) {
                    inner.history.add(keyword);
                }
                inner.applied = Some(params);
                SearchOutcome::Applied
            }
            (Request::Recent { days }, Ok(page)) => {
                info!("recent ({} days) returned {} results", days, page.total_results);
                let page_size = match page.results_per_page {
                    0 => self.config.results_per_page,
                    n => n,
                };
                self.state.send_modify(|state| state.apply_page(page, 0, page_size));
                SearchOutcome::Applied
            }
            (Request::ById(id), Ok(page)) if page.is_empty() => self.fail(not_found_message(&id)),
            (Request::ById(id), Err(err)) if err.is_not_found() => {
                self.fail(not_found_message(&id))
            }
            (Request::ById(id), Ok(page)) => {
                info!("lookup {} returned {} records", id, page.vulnerabilities.len());
                self.state.send_modify(|state| state.apply_lookup(page));
                SearchOutcome::Applied
            }
            (request, Err(err)) => self.fail(request.failure_message(&err)),
        }
    }

    fn fail(&self, message: String) -> SearchOutcome {
        warn!("{}", message);
        self.state
            .send_modify(|state| state.apply_failure(message.clone()));
        SearchOutcome::Failed(message)
    }
}

/// Drives searches against a [`VulnerabilityApi`] and owns the resulting
/// [`SearchState`], filters and history.
///
/// Cheap to clone; clones share the same state. Dispatching methods spawn
/// onto the current tokio runtime and must be called from within one.
#[derive(Clone)]
pub struct SearchCoordinator {
    shared: Arc<Shared>,
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn VulnerabilityApi>, config: EngineConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.min_request_interval));
        Self::with_limiter(api, limiter, config)
    }

    /// Build a coordinator that shares `limiter` with other call sites.
    pub fn with_limiter(
        api: Arc<dyn VulnerabilityApi>,
        limiter: Arc<RateLimiter>,
        config: EngineConfig,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::new(config.results_per_page));
        let inner = Inner {
            filters: SearchFilters::defaults(config.results_per_page),
            applied: None,
            history: SearchHistory::new(),
            generation: 0,
            pending: Pending::Idle,
        };
        Self {
            shared: Arc::new(Shared {
                api,
                limiter,
                config,
                inner: Mutex::new(inner),
                state,
            }),
        }
    }

    /// Seed the keyword history, e.g. from a stored copy.
    pub fn with_history(self, history: SearchHistory) -> Self {
        self.shared.lock().history = history;
        self
    }

    // ===== Dispatching operations =====

    /// Merge `overrides` onto the current filters and search with the result
    /// after the search debounce delay.
    ///
    /// Changing any criterion without naming a `start_index` goes back to the
    /// first page.
    pub fn search(&self, overrides: SearchFilters) -> SearchHandle {
        let mut inner = self.shared.lock();
        let mut filters = inner.filters.merged(&overrides);
        if overrides.start_index.is_none() && !filters.same_criteria(&inner.filters) {
            filters.start_index = Some(0);
        }
        inner.filters = filters;
        let params = inner.filters.to_params();
        let debounce = self.shared.config.search_debounce;
        self.dispatch(&mut inner, Request::Filtered(params), Some(debounce))
    }

    /// Reset the filters to their defaults and search with them.
    pub fn clear_filters(&self) -> SearchHandle {
        let mut inner = self.shared.lock();
        inner.filters = SearchFilters::defaults(self.shared.config.results_per_page);
        let params = inner.filters.to_params();
        let debounce = self.shared.config.search_debounce;
        self.dispatch(&mut inner, Request::Filtered(params), Some(debounce))
    }

    /// Search the given 0-based page with the current filters.
    ///
    /// Returns `None` without doing anything while a request is loading.
    pub fn go_to_page(&self, page: u32) -> Option<SearchHandle> {
        let mut inner = self.shared.lock();
        if self.shared.state.borrow().loading {
            debug!("ignoring page change to {} while loading", page);
            return None;
        }

        let page_size = inner
            .filters
            .results_per_page
            .unwrap_or(self.shared.config.results_per_page);
        let page_size = pagination::clamp_page_size(page_size).get();
        let start_index = match pagination::checked_offset(page, page_size) {
            Ok(offset) => offset,
            Err(e) => {
                warn!("ignoring page change to {}: {}", page, e);
                return None;
            }
        };
        inner.filters = inner.filters.merged(&SearchFilters::page_offset(start_index));
        let params = inner.filters.to_params();
        let debounce = self.shared.config.search_debounce;
        Some(self.dispatch(&mut inner, Request::Filtered(params), Some(debounce)))
    }

    pub fn next_page(&self) -> Option<SearchHandle> {
        let state = self.state();
        state
            .has_next_page()
            .then(|| self.go_to_page(state.current_page + 1))
            .flatten()
    }

    pub fn previous_page(&self) -> Option<SearchHandle> {
        let state = self.state();
        state
            .has_previous_page()
            .then(|| self.go_to_page(state.current_page - 1))
            .flatten()
    }

    /// Fetch records published in the last `days` days, after the recent
    /// debounce delay.
    pub fn get_recent(&self, days: u32) -> SearchHandle {
        let mut inner = self.shared.lock();
        let debounce = self.shared.config.recent_debounce;
        self.dispatch(&mut inner, Request::Recent { days }, Some(debounce))
    }

    /// Look up one record by identifier. Not debounced, still rate limited.
    pub fn search_by_id(&self, id: &str) -> SearchHandle {
        let mut inner = self.shared.lock();
        self.dispatch(&mut inner, Request::ById(id.trim().to_string()), None)
    }

    /// Cancel whatever is pending and leave the current results in place.
    pub fn cancel(&self) {
        let mut inner = self.shared.lock();
        inner.pending.cancel();
        inner.generation += 1;
        self.shared.state.send_modify(|state| state.loading = false);
    }

    fn dispatch(&self, inner: &mut Inner, request: Request, debounce: Option<Duration>) -> SearchHandle {
        inner.pending.cancel();
        inner.generation += 1;
        let generation = inner.generation;

        info!("scheduling request {}: {}", generation, request);
        self.shared.state.send_modify(SearchState::begin);

        let task = tokio::spawn(self.shared.clone().run(generation, request, debounce));
        let abort = task.abort_handle();
        inner.pending = match debounce {
            Some(_) => Pending::Debouncing { generation, abort },
            None => Pending::InFlight { generation, abort },
        };

        SearchHandle { generation, task }
    }

    // ===== Read access =====

    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    /// Current raw filters, including UI-only fields.
    pub fn filters(&self) -> SearchFilters {
        self.shared.lock().filters.clone()
    }

    /// Payload of the last committed filtered search.
    pub fn applied_params(&self) -> Option<QueryParams> {
        self.shared.lock().applied.clone()
    }

    pub fn history(&self) -> SearchHistory {
        self.shared.lock().history.clone()
    }

    pub fn remove_history(&self, term: &str) -> bool {
        self.shared.lock().history.remove(term)
    }

    pub fn clear_history(&self) {
        self.shared.lock().history.clear();
    }

    /// Toggle the UI-only advanced filter flag. Does not search.
    pub fn set_show_advanced(&self, visible: bool) {
        self.shared.lock().filters.show_advanced = Some(visible);
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.shared.limiter
    }
}
