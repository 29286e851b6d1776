//! Common traits for dataview.
//!
//! These are the functional contracts the data-access layer consumes: loaders that
//! talk to the outside world and a scheduler that owns timers. Everything that does
//! I/O lives behind one of them so tests can inject deterministic implementations.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Loads the value for a single key.
///
/// Implementations typically wrap an HTTP call. Timeouts are the loader's concern.
#[async_trait]
pub trait Loader<K, V>: Send + Sync {
    /// Loads the value for `key`.
    async fn load(&self, key: &K) -> Result<V>;
}

/// Loads several keys with one underlying request.
///
/// Used for responses that naturally cover more than one key, such as a single
/// three-month calendar request populating three monthly entries.
#[async_trait]
pub trait BulkLoader<K, V>: Send + Sync {
    /// Loads every key in `keys`, returning one `(key, value)` pair per key covered.
    async fn load_many(&self, keys: &[K]) -> Result<Vec<(K, V)>>;
}

/// Runs a search query.
///
/// The token is cancelled when the query is superseded. Honouring it is optional;
/// stale results are discarded by the caller either way.
#[async_trait]
pub trait SearchLoader<T>: Send + Sync {
    /// Returns the results for `query`.
    async fn search(&self, query: &str, token: CancellationToken) -> Result<Vec<T>>;
}

/// [`Loader`] backed by a closure.
pub struct FnLoader<F, K, V> {
    f: F,
    _marker: PhantomData<fn(K) -> V>,
}

/// Wraps `f` as a [`Loader`].
pub fn loader_fn<F, Fut, K, V>(f: F) -> FnLoader<F, K, V>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V>> + Send,
{
    FnLoader {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, K, V> Loader<K, V> for FnLoader<F, K, V>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V>> + Send + 'static,
    K: Clone + Send + Sync,
    V: Send,
{
    async fn load(&self, key: &K) -> Result<V> {
        (self.f)(key.clone()).await
    }
}

/// [`SearchLoader`] backed by a closure.
pub struct FnSearchLoader<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

/// Wraps `f` as a [`SearchLoader`].
pub fn search_fn<F, Fut, T>(f: F) -> FnSearchLoader<F, T>
where
    F: Fn(String, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    FnSearchLoader {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T> SearchLoader<T> for FnSearchLoader<F, T>
where
    F: Fn(String, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send + 'static,
    T: Send,
{
    async fn search(&self, query: &str, token: CancellationToken) -> Result<Vec<T>> {
        (self.f)(query.to_string(), token).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle to a task registered with a [`Scheduler`].
///
/// Dropping the handle detaches the task; only [`ScheduledTask::cancel`] stops it.
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ScheduledTask {
    /// Creates a handle that runs `cancel` when the task is cancelled.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Creates a handle for a task that cannot be cancelled.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Cancels the task. A task that already ran is unaffected.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Runs a future after a delay.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask;
}
