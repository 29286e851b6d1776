//! Single-flight fetch coordination on top of a TTL cache.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use dataview_cache::{CacheConfig, TtlCache};
use dataview_core::constants::DEFAULT_CACHE_TTL;
use dataview_core::error::{DataviewError, Result};
use dataview_core::traits::{BulkLoader, Loader};
use dataview_core::types::{to_millis, QueryKey};

/// Coordinator configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// How long a loaded value stays fresh, in milliseconds
    pub cache_ttl_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: to_millis(DEFAULT_CACHE_TTL),
        }
    }
}

impl FetchConfig {
    /// Sets the cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = to_millis(ttl);
        self
    }

    fn ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

/// A load in progress, shared by every caller that asked for its key.
struct InFlight<V> {
    generation: u64,
    future: SharedFetch<V>,
}

/// Removes an in-flight marker when the loader task ends, however it ends.
struct InFlightGuard<V> {
    in_flight: Arc<DashMap<String, InFlight<V>>>,
    key: String,
    generation: u64,
}

impl<V> Drop for InFlightGuard<V> {
    fn drop(&mut self) {
        // A newer load may already own the key after an invalidation; leave it alone
        self.in_flight
            .remove_if(&self.key, |_, entry| entry.generation == self.generation);
    }
}

enum Lookup<V> {
    Cached(V),
    Pending(SharedFetch<V>),
}

/// Wraps caller-supplied loaders with caching and request coalescing.
///
/// - A fresh cache entry is returned without calling the loader.
/// - Concurrent requests for the same uncached key share one loader call and all
///   observe the same value or the same error.
/// - Loads run on their own task, so dropping every caller never strands the
///   in-flight marker; the marker is removed when the load settles.
/// - Failures are not cached: the next request retries.
///
/// Cloning is cheap and clones share the cache and the in-flight map.
pub struct FetchCoordinator<V> {
    cache: Arc<TtlCache<String, V>>,
    in_flight: Arc<DashMap<String, InFlight<V>>>,
    next_generation: Arc<AtomicU64>,
    config: FetchConfig,
}

impl<V> Clone for FetchCoordinator<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            in_flight: Arc::clone(&self.in_flight),
            next_generation: Arc::clone(&self.next_generation),
            config: self.config.clone(),
        }
    }
}

impl<V> FetchCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a coordinator with its own cache and default configuration.
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    /// Creates a coordinator with its own cache.
    pub fn with_config(config: FetchConfig) -> Self {
        let cache = TtlCache::with_config(CacheConfig::default().ttl(config.ttl()));
        Self::with_cache(Arc::new(cache), config)
    }

    /// Creates a coordinator over an existing cache.
    ///
    /// Use this to share one cache between several coordinators or to inspect the
    /// cache from tests.
    pub fn with_cache(cache: Arc<TtlCache<String, V>>, config: FetchConfig) -> Self {
        Self {
            cache,
            in_flight: Arc::new(DashMap::new()),
            next_generation: Arc::new(AtomicU64::new(1)),
            config,
        }
    }

    /// Returns the underlying cache.
    pub fn cache(&self) -> &Arc<TtlCache<String, V>> {
        &self.cache
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Returns the cached value for `key`, if fresh.
    pub fn cached<K: QueryKey>(&self, key: &K) -> Option<V> {
        self.cache.get(key.cache_key().as_str())
    }

    /// Returns true if a load for `key` is in progress.
    pub fn is_in_flight<K: QueryKey>(&self, key: &K) -> bool {
        self.in_flight.contains_key(key.cache_key().as_str())
    }

    /// Number of loads in progress.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Fetches the value for `key`, calling `loader` only if needed.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, key, loader), fields(key = %key.cache_key()))]
    pub async fn fetch_data<K, F, Fut>(&self, key: K, loader: F) -> Result<V>
    where
        K: QueryKey,
        F: FnOnce(K) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let cache_key = key.cache_key();
        let lookup = self.lookup(cache_key.clone(), move || async move {
            let value = loader(key).await?;
            Ok::<_, DataviewError>(vec![(cache_key, value)])
        });

        match lookup {
            Lookup::Cached(value) => Ok(value),
            Lookup::Pending(future) => future.await,
        }
    }

    /// Fetches `key` through a [`Loader`].
    pub async fn fetch_with<K>(&self, key: K, loader: Arc<dyn Loader<K, V>>) -> Result<V>
    where
        K: QueryKey,
    {
        self.fetch_data(key, move |key| async move { loader.load(&key).await })
            .await
    }

    /// Fetches `key` with one request that also covers `covered`.
    ///
    /// Every key present in the response is cached. The value for `key` is returned,
    /// or [`DataviewError::MissingBulkKey`] if the response left it out.
    #[instrument(skip(self, key, covered, loader), fields(key = %key.cache_key(), covered = covered.len()))]
    pub async fn fetch_bulk<K, F, Fut>(&self, key: K, covered: Vec<K>, loader: F) -> Result<V>
    where
        K: QueryKey,
        F: FnOnce(Vec<K>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<(K, V)>>> + Send + 'static,
    {
        let cache_key = key.cache_key();
        let mut keys = vec![key];
        keys.extend(
            covered
                .into_iter()
                .filter(|other| other.cache_key() != cache_key),
        );

        let lookup = self.lookup(cache_key, move || async move {
            let entries = loader(keys).await?;
            Ok::<Vec<(String, V)>, DataviewError>(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.cache_key(), value))
                    .collect(),
            )
        });

        match lookup {
            Lookup::Cached(value) => Ok(value),
            Lookup::Pending(future) => future.await,
        }
    }

    /// Fetches `key` and `covered` through a [`BulkLoader`].
    pub async fn fetch_bulk_with<K>(
        &self,
        key: K,
        covered: Vec<K>,
        loader: Arc<dyn BulkLoader<K, V>>,
    ) -> Result<V>
    where
        K: QueryKey,
    {
        self.fetch_bulk(key, covered, move |keys| async move {
            loader.load_many(&keys).await
        })
        .await
    }

    /// Warms the cache for `key` without waiting for the result.
    ///
    /// Joins an existing load if there is one. Errors are never reported to the
    /// caller. Must be called from within a tokio runtime.
    pub fn prefetch<K, F, Fut>(&self, key: K, loader: F)
    where
        K: QueryKey,
        F: FnOnce(K) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let cache_key = key.cache_key();
        let lookup = self.lookup(cache_key.clone(), move || async move {
            let value = loader(key).await?;
            Ok::<_, DataviewError>(vec![(cache_key, value)])
        });

        if let Lookup::Pending(_) = lookup {
            debug!("Prefetch started");
        }
    }

    /// Warms the cache for `key` through a [`Loader`].
    pub fn prefetch_with<K>(&self, key: K, loader: Arc<dyn Loader<K, V>>)
    where
        K: QueryKey,
    {
        self.prefetch(key, move |key| async move { loader.load(&key).await });
    }

    /// Drops the cached value for `key`. A load already in flight is not affected.
    pub fn invalidate<K: QueryKey>(&self, key: &K) -> bool {
        let removed = self.cache.remove(key.cache_key().as_str());
        if removed {
            debug!(key = %key.cache_key(), "Invalidated cache entry");
        }
        removed
    }

    /// Drops every cached value.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    /// Returns a cached value or a handle to the load for `cache_key`, starting the
    /// load if nobody else has.
    fn lookup<F, Fut>(&self, cache_key: String, load: F) -> Lookup<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<(String, V)>>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(cache_key.as_str()) {
            debug!(key = %cache_key, "Cache hit");
            return Lookup::Cached(value);
        }

        let (generation, sender, future) = match self.in_flight.entry(cache_key.clone()) {
            Entry::Occupied(entry) => {
                debug!(key = %cache_key, "Joining in-flight load");
                return Lookup::Pending(entry.get().future.clone());
            }
            Entry::Vacant(entry) => {
                // The previous load may have settled between the cache miss and here
                if let Some(value) = self.cache.get(cache_key.as_str()) {
                    return Lookup::Cached(value);
                }

                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = oneshot::channel();
                let future = receiver
                    .map(|received| {
                        received.unwrap_or_else(|_| {
                            Err(DataviewError::InternalError(
                                "load ended without a result".into(),
                            ))
                        })
                    })
                    .boxed()
                    .shared();

                entry.insert(InFlight {
                    generation,
                    future: future.clone(),
                });
                (generation, sender, future)
            }
        };

        debug!(key = %cache_key, "Cache miss, loading");
        self.spawn_load(cache_key, generation, sender, load);
        Lookup::Pending(future)
    }

    /// Runs `load` on its own task: caches what it returns, releases the in-flight
    /// marker, then hands the outcome to the waiting callers.
    fn spawn_load<F, Fut>(
        &self,
        cache_key: String,
        generation: u64,
        sender: oneshot::Sender<Result<V>>,
        load: F,
    ) where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<(String, V)>>> + Send + 'static,
    {
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key: cache_key.clone(),
            generation,
        };
        let cache = Arc::clone(&self.cache);
        let ttl = self.config.ttl();

        tokio::spawn(async move {
            let result = match load().await {
                Ok(entries) => {
                    let covered = entries.len();
                    let mut primary = None;
                    for (key, value) in entries {
                        if key == cache_key {
                            primary = Some(value.clone());
                        }
                        cache.set_with_ttl(key, value, ttl);
                    }

                    match primary {
                        Some(value) => {
                            info!(key = %cache_key, covered, "Loaded");
                            Ok(value)
                        }
                        None => {
                            warn!(key = %cache_key, covered, "Response did not cover requested key");
                            Err(DataviewError::MissingBulkKey(cache_key))
                        }
                    }
                }
                Err(err) => {
                    if !err.is_cancellation() {
                        warn!(key = %cache_key, error = %err, "Load failed");
                    }
                    Err(err)
                }
            };

            drop(guard);
            // Every caller may have gone away; the cache is already populated
            let _ = sender.send(result);
        });
    }
}

impl<V> Default for FetchCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use dataview_core::types::MonthKey;
    use dataview_core::traits::loader_fn;

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        value: u32,
    ) -> impl FnOnce(String) -> BoxFuture<'static, Result<u32>> + Send + 'static {
        let calls = Arc::clone(calls);
        move |_key| {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    fn failing_loader(
        calls: &Arc<AtomicUsize>,
    ) -> impl FnOnce(String) -> BoxFuture<'static, Result<u32>> + Send + 'static {
        let calls = Arc::clone(calls);
        move |key| {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(DataviewError::loader(key, "HTTP 503"))
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_loader() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(5), 7))
            .await
            .unwrap();
        let second = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(5), 8))
            .await
            .unwrap();

        assert_eq!((first, second), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_load() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let fetches = (0..5).map(|i| {
            coordinator.fetch_data(
                "2024-03".to_string(),
                counting_loader(&calls, Duration::from_millis(100), 100 + i),
            )
        });
        let results = futures::future::join_all(fetches).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let values: Vec<u32> = results.into_iter().map(Result::unwrap).collect();
        assert!(values.iter().all(|v| *v == values[0]));
        assert_eq!(coordinator.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_reaches_every_caller_and_is_not_cached() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            coordinator.fetch_data("k".to_string(), failing_loader(&calls)),
            coordinator.fetch_data("k".to_string(), failing_loader(&calls)),
            coordinator.fetch_data("k".to_string(), failing_loader(&calls)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let expected = DataviewError::loader("k", "HTTP 503");
        assert_eq!(a.unwrap_err(), expected);
        assert_eq!(b.unwrap_err(), expected);
        assert_eq!(c.unwrap_err(), expected);

        assert!(coordinator.cached(&"k".to_string()).is_none());
        assert!(!coordinator.is_in_flight(&"k".to_string()));

        // Retry goes back to the loader
        let value = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 9))
            .await
            .unwrap();
        assert_eq!(value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_isolated_per_key() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (bad, good) = tokio::join!(
            coordinator.fetch_data("bad".to_string(), failing_loader(&calls)),
            coordinator.fetch_data(
                "good".to_string(),
                counting_loader(&calls, Duration::from_millis(20), 1)
            ),
        );

        assert!(bad.is_err());
        assert_eq!(good.unwrap(), 1);
        assert_eq!(coordinator.cached(&"good".to_string()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_marker_lifecycle() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator.prefetch(
            "k".to_string(),
            counting_loader(&calls, Duration::from_millis(50), 3),
        );
        assert!(coordinator.is_in_flight(&"k".to_string()));

        // Joins the prefetch instead of loading again
        let value = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(50), 4))
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_in_flight(&"k".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_loader_releases_marker() {
        let coordinator = FetchCoordinator::<u32>::new();

        let result = coordinator
            .fetch_data("k".to_string(), |_key: String| async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                let broken = true;
                if broken {
                    panic!("loader bug");
                }
                Ok(0)
            })
            .await;

        assert!(matches!(result, Err(DataviewError::InternalError(_))));
        assert_eq!(coordinator.in_flight_count(), 0);

        let calls = Arc::new(AtomicUsize::new(0));
        let value = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 5))
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_does_not_strand_load() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = coordinator.fetch_data(
            "k".to_string(),
            counting_loader(&calls, Duration::from_millis(100), 11),
        );
        // Poll once so the load starts, then abandon the caller
        let _ = tokio::time::timeout(Duration::from_millis(10), fetch).await;
        assert!(coordinator.is_in_flight(&"k".to_string()));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!coordinator.is_in_flight(&"k".to_string()));
        assert_eq!(coordinator.cached(&"k".to_string()), Some(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_swallows_errors() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator.prefetch("k".to_string(), failing_loader(&calls));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight_count(), 0);
        assert!(coordinator.cached(&"k".to_string()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_of_cached_key_is_a_no_op() {
        let coordinator = FetchCoordinator::<u32>::new();
        coordinator.cache().set("k".to_string(), 1);
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator.prefetch(
            "k".to_string(),
            counting_loader(&calls, Duration::from_millis(1), 2),
        );

        assert!(!coordinator.is_in_flight(&"k".to_string()));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_load_populates_every_month() {
        let coordinator = FetchCoordinator::<String>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let march = MonthKey::new(2024, 3).unwrap();
        let value = coordinator
            .fetch_bulk(march, march.adjacent(), move |keys: Vec<MonthKey>| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(keys
                    .into_iter()
                    .map(|k| (k, format!("days of {}", k)))
                    .collect())
            })
            .await
            .unwrap();

        assert_eq!(value, "days of 2024-03");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            coordinator.cached(&march.previous()).as_deref(),
            Some("days of 2024-02")
        );
        assert_eq!(
            coordinator.cached(&march.next()).as_deref(),
            Some("days of 2024-04")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_response_missing_primary_key() {
        let coordinator = FetchCoordinator::<u32>::new();
        let march = MonthKey::new(2024, 3).unwrap();
        let april = march.next();

        let result = coordinator
            .fetch_bulk(march, vec![april], move |_keys: Vec<MonthKey>| async move {
                Ok(vec![(april, 30)])
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            DataviewError::MissingBulkKey("2024-03".into())
        );
        assert_eq!(coordinator.cached(&april), Some(30));
        assert!(coordinator.cached(&march).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_reload() {
        let coordinator = FetchCoordinator::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 1))
            .await
            .unwrap();
        assert!(coordinator.invalidate(&"k".to_string()));
        let value = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 2))
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_reloaded() {
        let coordinator =
            FetchCoordinator::<u32>::with_config(FetchConfig::default().cache_ttl(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        let value = coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 2))
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_ttl_is_honored() {
        let coordinator = FetchCoordinator::<u32>::with_config(
            FetchConfig::default().cache_ttl(Duration::from_millis(900)),
        );
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(1), 1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(coordinator.cached(&"k".to_string()), Some(1));

        tokio::time::advance(Duration::from_millis(900)).await;
        assert!(coordinator.cached(&"k".to_string()).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_trait_loader() {
        let coordinator = FetchCoordinator::<usize>::new();
        let loader: Arc<dyn Loader<MonthKey, usize>> =
            Arc::new(loader_fn(|key: MonthKey| async move { Ok(key.month() as usize) }));

        let value = coordinator
            .fetch_with(MonthKey::new(2024, 9).unwrap(), loader)
            .await
            .unwrap();
        assert_eq!(value, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let coordinator = FetchCoordinator::<u32>::new();
        let clone = coordinator.clone();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            coordinator.fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(10), 1)),
            clone.fetch_data("k".to_string(), counting_loader(&calls, Duration::from_millis(10), 2)),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
