//! In-memory TTL cache.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use dataview_core::constants::{DEFAULT_CACHE_CAPACITY_HINT, DEFAULT_CACHE_TTL};
use dataview_core::error::{DataviewError, Result};
use dataview_core::types::to_millis;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Insertion order; ties on `inserted_at` are common under a coarse or paused clock
    seq: u64,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries (None = unbounded)
    pub max_entries: Option<usize>,
    /// Default TTL in milliseconds
    pub default_ttl_ms: u64,
    /// Whether to sweep expired entries before evicting live ones
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: None,
            default_ttl_ms: to_millis(DEFAULT_CACHE_TTL),
            auto_cleanup: true,
        }
    }
}

impl CacheConfig {
    /// Creates a bounded configuration.
    pub fn bounded(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            max_entries: Some(max_entries),
            default_ttl_ms: to_millis(default_ttl),
            auto_cleanup: true,
        }
    }

    /// Sets the default TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = to_millis(ttl);
        self
    }

    /// Returns the default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Checks the configuration for values that would make the cache useless.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(DataviewError::ConfigError(
                "cache max_entries must be at least 1".into(),
            ));
        }
        if self.default_ttl_ms == 0 {
            return Err(DataviewError::ConfigError(
                "cache default TTL must be at least one millisecond".into(),
            ));
        }
        Ok(())
    }
}

/// In-memory key/value cache with per-entry expiry.
///
/// Thread-safe. Nothing runs in the background: an entry past its TTL is treated as
/// absent by every read and removed by the read that notices it.
///
/// When bounded and full, inserting a new key evicts the oldest-*inserted* entry.
/// Reads do not refresh an entry's position, so this is FIFO rather than LRU.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    next_seq: AtomicU64,
    config: CacheConfig,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an unbounded cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        let capacity = config
            .max_entries
            .unwrap_or(DEFAULT_CACHE_CAPACITY_HINT)
            .min(4096);
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            next_seq: AtomicU64::new(0),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets a cached value.
    ///
    /// Returns None if not cached or expired. An expired entry is purged.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.upgradable_read();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            RwLockUpgradableReadGuard::upgrade(entries).remove(key);
        }
        None
    }

    /// Returns true if a live entry exists for `key`.
    ///
    /// Same expiry rule as [`TtlCache::get`], without cloning the value.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.upgradable_read();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired() => return true,
            Some(_) => true,
            None => false,
        };
        if expired {
            RwLockUpgradableReadGuard::upgrade(entries).remove(key);
        }
        false
    }

    /// Caches a value with the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl());
    }

    /// Caches a value with a custom TTL, replacing any existing entry.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.write();

        if let Some(max_entries) = self.config.max_entries {
            if max_entries == 0 {
                return;
            }

            if !entries.contains_key(&key) && entries.len() >= max_entries {
                if self.config.auto_cleanup {
                    entries.retain(|_, entry| !entry.is_expired());
                }

                // Still at capacity? Remove the oldest insertion
                if entries.len() >= max_entries {
                    if let Some(oldest_key) = entries
                        .iter()
                        .min_by_key(|(_, e)| e.seq)
                        .map(|(k, _)| k.clone())
                    {
                        entries.remove(&oldest_key);
                    }
                }
            }
        }

        // Taken under the write lock, so sequence order is insertion order
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                seq,
                ttl,
            },
        );
    }

    /// Removes a cached entry. Returns true if an entry (live or expired) was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.write().remove(key).is_some()
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.write().retain(|_, entry| !entry.is_expired());
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.read().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Maximum capacity (None = unbounded)
    pub capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(max_entries: usize) -> TtlCache<String, u32> {
        TtlCache::with_config(CacheConfig::bounded(max_entries, Duration::from_secs(3600)))
    }

    #[test]
    fn test_cache_set_get() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("2024-03".into(), 31);
        assert_eq!(cache.get("2024-03"), Some(31));
        assert!(cache.has("2024-03"));
    }

    #[test]
    fn test_cache_miss() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        assert!(cache.get("nonexistent").is_none());
        assert!(!cache.has("nonexistent"));
    }

    #[test]
    fn test_cache_overwrite() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("k".into(), 1);
        cache.set("k".into(), 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_remove() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("k".into(), 1);
        assert!(cache.remove("k"));
        assert!(!cache.remove("k"));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_cache_clear() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_ttl_expiration() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set_with_ttl("k".into(), 7, Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!cache.has("k"));
        assert!(cache.get("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_read_purges_entry() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set_with_ttl("k".into(), 7, Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set_with_ttl("k".into(), 1, Duration::from_millis(50));
        tokio::time::advance(Duration::from_millis(40)).await;
        cache.set_with_ttl("k".into(), 2, Duration::from_millis(50));
        tokio::time::advance(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_cache_ttl_expiration_wall_clock() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set_with_ttl("k".into(), 1, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest_insertion() {
        let cache = bounded(2);
        cache.set("a".into(), 1);
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("b".into(), 2);
        tokio::time::advance(Duration::from_millis(1)).await;

        // Reading "a" does not protect it: eviction follows insertion order
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c".into(), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_first_inserted_on_same_instant() {
        let cache = bounded(2);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.set("c".into(), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_moves_key_to_back_of_eviction_order() {
        let cache = bounded(2);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.set("a".into(), 10);
        cache.set("c".into(), 3);

        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_default_ttl() {
        let cache: TtlCache<String, u32> =
            TtlCache::with_config(CacheConfig::default().ttl(Duration::from_millis(900)));
        assert_eq!(cache.config().default_ttl(), Duration::from_millis(900));
        cache.set("k".into(), 1);

        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k"), Some(1));

        tokio::time::advance(Duration::from_millis(891)).await;
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = bounded(2);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.set("a".into(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_prefers_sweeping_expired() {
        let cache = bounded(2);
        cache.set_with_ttl("short".into(), 1, Duration::from_millis(5));
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("long".into(), 2);
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.set("new".into(), 3);

        assert_eq!(cache.get("long"), Some(2));
        assert_eq!(cache.get("new"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_stats() {
        let cache = bounded(10);
        cache.set("a".into(), 1);
        cache.set_with_ttl("b".into(), 2, Duration::from_millis(1));
        tokio::time::advance(Duration::from_millis(5)).await;

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.capacity, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_cleanup_expired() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set_with_ttl("a".into(), 1, Duration::from_millis(1));
        cache.set("b".into(), 2);
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.cleanup_expired();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_config_validate() {
        assert!(CacheConfig::default().validate().is_ok());
        assert!(CacheConfig::bounded(0, Duration::from_secs(60)).validate().is_err());
        assert!(CacheConfig::default().ttl(Duration::ZERO).validate().is_err());
        assert!(CacheConfig::default().ttl(Duration::from_millis(1)).validate().is_ok());
    }
}
