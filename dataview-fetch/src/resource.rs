//! A view's handle on one keyed resource, with a staleness guard.
//!
//! A calendar component shows one month at a time, but the user can click through
//! months faster than the network answers. [`ResourceView`] remembers which key is
//! currently wanted and only lets a finished load touch the visible state if it is
//! still for that key.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use dataview_core::error::{DataviewError, Result};
use dataview_core::traits::{BulkLoader, Loader};
use dataview_core::types::QueryKey;

use crate::coordinator::FetchCoordinator;

/// Resource view configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Prefetch [`QueryKey::adjacent`] keys after each successful selection
    pub prefetch_adjacent: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            prefetch_adjacent: true,
        }
    }
}

impl ResourceConfig {
    /// Disables adjacent prefetching.
    pub fn no_prefetch(mut self) -> Self {
        self.prefetch_adjacent = false;
        self
    }
}

/// Where a view gets its data from.
#[derive(Clone)]
pub enum Source<K, V> {
    /// One request per key.
    Single(Arc<dyn Loader<K, V>>),
    /// One request for the key and its adjacent keys.
    Bulk(Arc<dyn BulkLoader<K, V>>),
}

/// What a rendering layer reads.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot<K, V> {
    /// Currently wanted key
    pub key: Option<K>,
    /// Data for the wanted key, if loaded
    pub data: Option<V>,
    /// True while the wanted key is loading
    pub loading: bool,
    /// Last failure for the wanted key
    pub error: Option<DataviewError>,
}

struct ViewState<K, V> {
    wanted: Option<K>,
    data: Option<V>,
    loading: bool,
    error: Option<DataviewError>,
    disposed: bool,
}

impl<K, V> ViewState<K, V>
where
    K: QueryKey,
{
    fn wants(&self, key: &K) -> bool {
        !self.disposed
            && self
                .wanted
                .as_ref()
                .is_some_and(|wanted| wanted.cache_key() == key.cache_key())
    }
}

/// One consumer's view of a keyed resource.
///
/// Backed by a shared [`FetchCoordinator`], so two views selecting the same key
/// share one load. Dropping the view disposes it.
pub struct ResourceView<K, V> {
    coordinator: FetchCoordinator<V>,
    source: Source<K, V>,
    state: Arc<Mutex<ViewState<K, V>>>,
    config: ResourceConfig,
}

impl<K, V> ResourceView<K, V>
where
    K: QueryKey,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a view that loads one key per request.
    pub fn new(coordinator: FetchCoordinator<V>, loader: Arc<dyn Loader<K, V>>) -> Self {
        Self::with_config(coordinator, Source::Single(loader), ResourceConfig::default())
    }

    /// Creates a view with an explicit source and configuration.
    pub fn with_config(
        coordinator: FetchCoordinator<V>,
        source: Source<K, V>,
        config: ResourceConfig,
    ) -> Self {
        Self {
            coordinator,
            source,
            state: Arc::new(Mutex::new(ViewState {
                wanted: None,
                data: None,
                loading: false,
                error: None,
                disposed: false,
            })),
            config,
        }
    }

    /// Returns the coordinator backing this view.
    pub fn coordinator(&self) -> &FetchCoordinator<V> {
        &self.coordinator
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> ResourceSnapshot<K, V> {
        let state = self.state.lock();
        ResourceSnapshot {
            key: state.wanted.clone(),
            data: state.data.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Makes `key` the wanted key and loads it.
    ///
    /// A cached value is shown immediately. Otherwise the view is marked loading
    /// until the load settles; the outcome is applied only if `key` is still wanted
    /// by then. The load's own result is returned either way.
    #[instrument(skip(self, key), fields(key = %key.cache_key()))]
    pub async fn select(&self, key: K) -> Result<V> {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(DataviewError::Cancelled);
            }

            state.wanted = Some(key.clone());
            state.error = None;

            if let Some(value) = self.coordinator.cached(&key) {
                state.data = Some(value.clone());
                state.loading = false;
                drop(state);

                self.prefetch_adjacent(&key);
                return Ok(value);
            }

            state.data = None;
            state.loading = true;
        }

        let result = self.load(key.clone()).await;

        {
            let mut state = self.state.lock();
            if !state.wants(&key) {
                debug!("Discarding result for a key that is no longer wanted");
                return result;
            }

            state.loading = false;
            match &result {
                Ok(value) => {
                    state.data = Some(value.clone());
                    state.error = None;
                }
                Err(err) if err.is_cancellation() => {}
                Err(err) => state.error = Some(err.clone()),
            }
        }

        if result.is_ok() {
            self.prefetch_adjacent(&key);
        }
        result
    }

    /// Drops the cached value for the wanted key and loads it again.
    pub async fn refetch(&self) -> Result<V> {
        let wanted = self.state.lock().wanted.clone();
        match wanted {
            Some(key) => {
                self.coordinator.invalidate(&key);
                self.select(key).await
            }
            None => Err(DataviewError::ConfigError("no key selected".into())),
        }
    }

    /// Tears the view down. Loads still in flight finish but never touch this view.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if !state.disposed {
            debug!("Disposing resource view");
        }
        state.disposed = true;
        state.wanted = None;
        state.loading = false;
    }

    /// Returns true once the view has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    async fn load(&self, key: K) -> Result<V> {
        match &self.source {
            Source::Single(loader) => {
                self.coordinator
                    .fetch_with(key, Arc::clone(loader))
                    .await
            }
            Source::Bulk(loader) => {
                let covered = key.adjacent();
                self.coordinator
                    .fetch_bulk_with(key, covered, Arc::clone(loader))
                    .await
            }
        }
    }

    fn prefetch_adjacent(&self, key: &K) {
        if !self.config.prefetch_adjacent {
            return;
        }
        // Bulk responses already carry the neighbours
        if let Source::Single(loader) = &self.source {
            for neighbour in key.adjacent() {
                self.coordinator
                    .prefetch_with(neighbour, Arc::clone(loader));
            }
        }
    }
}

impl<K, V> Drop for ResourceView<K, V> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.disposed = true;
        state.wanted = None;
    }
}
