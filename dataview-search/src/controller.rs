//! Debounced search with ticket fencing and cooperative cancellation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use dataview_cache::{CacheConfig, CacheStats, TtlCache};
use dataview_core::constants::{
    DEFAULT_MIN_QUERY_LENGTH, DEFAULT_SEARCH_CACHE_ENTRIES, DEFAULT_SEARCH_CACHE_TTL,
    DEFAULT_SEARCH_DELAY,
};
use dataview_core::error::{DataviewError, Result};
use dataview_core::traits::{ScheduledTask, Scheduler, SearchLoader};
use dataview_core::types::to_millis;

use crate::timer::TokioScheduler;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Search controller configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before searching, in milliseconds
    pub delay_ms: u64,
    /// Queries shorter than this (in characters) never reach the loader
    pub min_length: usize,
    /// Search on the first keystroke of a burst instead of waiting
    pub immediate: bool,
    /// Result cache; `None` disables caching
    pub cache: Option<SearchCacheConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_SEARCH_DELAY.as_millis() as u64,
            min_length: DEFAULT_MIN_QUERY_LENGTH,
            immediate: false,
            cache: None,
        }
    }
}

impl SearchConfig {
    /// Sets the debounce delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the minimum query length.
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Enables or disables leading-edge searches.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Enables the result cache.
    pub fn cached(mut self, cache: SearchCacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the debounce delay.
    pub fn delay_duration(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Checks the configuration for values the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        match &self.cache {
            Some(cache) => cache.cache_config().validate(),
            None => Ok(()),
        }
    }
}

/// Bounded cache of search results keyed by normalized query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchCacheConfig {
    /// Maximum number of cached queries
    pub max_entries: usize,
    /// How long a cached result stays fresh, in milliseconds
    pub ttl_ms: u64,
}

impl Default for SearchCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_SEARCH_CACHE_ENTRIES,
            ttl_ms: to_millis(DEFAULT_SEARCH_CACHE_TTL),
        }
    }
}

impl SearchCacheConfig {
    /// Creates a cache configuration.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries,
            ttl_ms: to_millis(ttl),
        }
    }

    fn cache_config(&self) -> CacheConfig {
        CacheConfig::bounded(self.max_entries, Duration::from_millis(self.ttl_ms))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the controller is in its search cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Nothing searched yet, or cleared
    #[default]
    Idle,
    /// Waiting for the user to stop typing
    Debouncing,
    /// Loader call in progress
    Fetching,
    /// Results are current
    Resolved,
    /// The last search failed
    Rejected,
    /// The last search was abandoned
    Cancelled,
}

/// Point-in-time view of a controller.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchSnapshot<T> {
    /// Most recent query passed to `search`
    pub query: String,
    /// Results of the most recent applied search
    pub results: Vec<T>,
    /// Failure of the most recent search, if it failed
    pub error: Option<DataviewError>,
    /// Current phase
    pub phase: SearchPhase,
    /// Current ticket
    pub ticket: u64,
    /// A loader call is in progress
    pub is_searching: bool,
    /// There is at least one result
    pub has_results: bool,
    /// A long-enough query settled with nothing to show
    pub is_empty: bool,
}

struct SearchState<T> {
    ticket: u64,
    pending: Option<ScheduledTask>,
    token: Option<CancellationToken>,
    query: String,
    results: Vec<T>,
    error: Option<DataviewError>,
    phase: SearchPhase,
    disposed: bool,
}

impl<T> SearchState<T> {
    /// Cancels the debounce timer and the in-flight request. Returns true if either
    /// existed.
    fn abort_pending(&mut self) -> bool {
        let mut aborted = false;
        if let Some(task) = self.pending.take() {
            task.cancel();
            aborted = true;
        }
        if let Some(token) = self.token.take() {
            token.cancel();
            aborted = true;
        }
        aborted
    }

    fn next_ticket(&mut self) -> u64 {
        self.ticket += 1;
        self.ticket
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

struct Inner<T> {
    loader: Arc<dyn SearchLoader<T>>,
    scheduler: Arc<dyn Scheduler>,
    config: SearchConfig,
    cache: Option<TtlCache<String, Vec<T>>>,
    state: Mutex<SearchState<T>>,
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Debounce timer expiry.
    fn fire(self: &Arc<Self>, ticket: u64, query: String) {
        let mut state = self.state.lock();
        if state.disposed || state.ticket != ticket {
            return;
        }
        state.pending = None;
        self.start_fetch(&mut state, ticket, query);
    }

    fn start_fetch(self: &Arc<Self>, state: &mut SearchState<T>, ticket: u64, query: String) {
        let token = CancellationToken::new();
        state.token = Some(token.clone());
        state.phase = SearchPhase::Fetching;
        debug!(ticket, query = %query, "Starting search");

        let loader = Arc::clone(&self.loader);
        let inner = Arc::downgrade(self);
        tokio::spawn(async move {
            let search = AssertUnwindSafe(loader.search(&query, token.clone())).catch_unwind();
            let outcome = tokio::select! {
                result = search => result.unwrap_or_else(|_| {
                    warn!(ticket, "Search loader panicked");
                    Err(DataviewError::InternalError("search loader panicked".into()))
                }),
                _ = token.cancelled() => Err(DataviewError::Cancelled),
            };
            if let Some(inner) = inner.upgrade() {
                inner.settle(ticket, &query, outcome);
            }
        });
    }

    fn settle(&self, ticket: u64, query: &str, outcome: Result<Vec<T>>) {
        let mut state = self.state.lock();
        if state.disposed || state.ticket != ticket {
            debug!(ticket, current = state.ticket, "Discarding stale search outcome");
            return;
        }

        state.token = None;
        match outcome {
            Ok(results) => {
                if let Some(cache) = &self.cache {
                    cache.set(normalize(query), results.clone());
                }
                info!(ticket, results = results.len(), "Search resolved");
                state.results = results;
                state.error = None;
                state.phase = SearchPhase::Resolved;
            }
            Err(err) if err.is_cancellation() => {
                debug!(ticket, "Search cancelled");
                state.phase = SearchPhase::Cancelled;
            }
            Err(err) => {
                warn!(ticket, error = %err, "Search failed");
                state.results.clear();
                state.error = Some(err);
                state.phase = SearchPhase::Rejected;
            }
        }
    }
}

/// Search-as-you-type controller.
///
/// Every call to [`search`](Self::search) mints a ticket. Only the outcome of the
/// latest ticket may change the visible state, so a slow response for an old query
/// can never overwrite a newer one. Superseded work is cancelled through the
/// loader's [`CancellationToken`]; cancellation is never reported as an error.
///
/// The controller spawns onto the ambient tokio runtime. Dropping it disposes it.
pub struct DebouncedSearchController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> DebouncedSearchController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a controller that uses tokio timers.
    pub fn new(loader: Arc<dyn SearchLoader<T>>, config: SearchConfig) -> Result<Self> {
        Self::with_scheduler(loader, config, Arc::new(TokioScheduler))
    }

    /// Creates a controller with an explicit timer implementation.
    ///
    /// The scheduler must not run tasks inline from `schedule`.
    pub fn with_scheduler(
        loader: Arc<dyn SearchLoader<T>>,
        config: SearchConfig,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = config
            .cache
            .as_ref()
            .map(|cache| TtlCache::with_config(cache.cache_config()));

        Ok(Self {
            inner: Arc::new(Inner {
                loader,
                scheduler,
                config,
                cache,
                state: Mutex::new(SearchState {
                    ticket: 0,
                    pending: None,
                    token: None,
                    query: String::new(),
                    results: Vec::new(),
                    error: None,
                    phase: SearchPhase::Idle,
                    disposed: false,
                }),
            }),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    /// Records a keystroke.
    ///
    /// Cancels whatever the previous query started. Short queries resolve to an empty
    /// result set without calling the loader; cached queries resolve at once;
    /// everything else is searched after the debounce delay.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.disposed {
            debug!("Ignoring search on a disposed controller");
            return;
        }

        let busy = state.abort_pending();
        let ticket = state.next_ticket();
        state.query = query.to_string();

        if query.chars().count() < inner.config.min_length {
            state.results.clear();
            state.error = None;
            state.phase = SearchPhase::Resolved;
            return;
        }

        if let Some(cache) = &inner.cache {
            if let Some(results) = cache.get(normalize(query).as_str()) {
                debug!(ticket, "Search cache hit");
                state.results = results;
                state.error = None;
                state.phase = SearchPhase::Resolved;
                return;
            }
        }

        if inner.config.immediate && !busy {
            inner.start_fetch(&mut state, ticket, query.to_string());
            return;
        }

        state.phase = SearchPhase::Debouncing;
        drop(state);

        let weak = Arc::downgrade(inner);
        let owned = query.to_string();
        let task = async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire(ticket, owned);
            }
        }
        .boxed();
        let scheduled = inner.scheduler.schedule(inner.config.delay_duration(), task);

        let mut state = inner.state.lock();
        if state.ticket == ticket && state.phase == SearchPhase::Debouncing {
            state.pending = Some(scheduled);
        } else if state.ticket != ticket {
            scheduled.cancel();
        }
    }

    /// Abandons the pending search. Results already shown stay.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        let aborted = state.abort_pending();
        state.next_ticket();
        if aborted {
            debug!("Search cancelled");
            state.phase = SearchPhase::Cancelled;
        }
    }

    /// Abandons pending work and forgets the query, results and error.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            return;
        }
        state.abort_pending();
        state.next_ticket();
        state.query.clear();
        state.results.clear();
        state.error = None;
        state.phase = SearchPhase::Idle;
    }

    /// Like [`clear`](Self::clear), and also empties the result cache.
    pub fn reset(&self) {
        self.clear();
        if let Some(cache) = &self.inner.cache {
            cache.clear();
        }
    }

    /// Tears the controller down. Later calls are ignored and in-flight work is
    /// discarded.
    pub fn dispose(&self) {
        dispose(&self.inner.state);
    }

    /// Returns true once the controller has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Returns the ticket of the most recent operation.
    pub fn current_ticket(&self) -> u64 {
        self.inner.state.lock().ticket
    }

    /// Returns result cache statistics, if caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.inner.cache.as_ref().map(TtlCache::stats)
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> SearchSnapshot<T> {
        let state = self.inner.state.lock();
        let busy = matches!(state.phase, SearchPhase::Debouncing | SearchPhase::Fetching);

        SearchSnapshot {
            query: state.query.clone(),
            results: state.results.clone(),
            error: state.error.clone(),
            phase: state.phase,
            ticket: state.ticket,
            is_searching: state.phase == SearchPhase::Fetching,
            has_results: !state.results.is_empty(),
            is_empty: state.results.is_empty()
                && !busy
                && state.query.chars().count() >= self.inner.config.min_length,
        }
    }
}

fn dispose<T>(state: &Mutex<SearchState<T>>) {
    let mut state = state.lock();
    if state.disposed {
        return;
    }
    state.abort_pending();
    state.next_ticket();
    state.disposed = true;
    debug!("Search controller disposed");
}

impl<T> Drop for DebouncedSearchController<T> {
    fn drop(&mut self) {
        dispose(&self.inner.state);
    }
}
