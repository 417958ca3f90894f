//! In-memory TTL cache

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// TTL applied by [`TtlCache::set_default`]
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Period of the background sweep started by [`TtlCache::start`]
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Longest TTL accepted; longer values are clamped
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

/// A cached value and its expiry
struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

/// Cache statistics (diagnostic only)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub keys: Vec<String>,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Process-local key/value cache with per-entry expiry
///
/// Values of any `'static` type can be stored under string keys. Every
/// operation takes a single mutex around the map and never holds it across
/// an `.await`, so the cache is safe to share between request handlers and
/// the background sweep.
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlCache {
    /// Create an empty cache. No background task is started.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            sweeper: Mutex::new(None),
        }
    }

    /// Get a value if present and not expired
    ///
    /// An expired entry is removed. An entry holding a different type than
    /// `T` counts as a miss and is left in place.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(key) {
            if now <= entry.expires_at {
                let value = entry.data.downcast_ref::<T>().cloned();
                drop(entries);
                self.record(value.is_some());
                return value;
            }
            entries.remove(key);
            debug!("Evicted expired cache entry on read: {}", key);
        }

        drop(entries);
        self.record(false);
        None
    }

    /// Store a value, replacing any existing entry for `key`
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        self.entries.lock().insert(
            key.into(),
            CacheEntry {
                data: Arc::new(value),
                expires_at,
            },
        );
    }

    /// Store a value with [`DEFAULT_TTL`]
    pub fn set_default<T>(&self, key: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.set(key, value, DEFAULT_TTL);
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Remove all entries
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Remove every entry that expired before now
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= now);
        before - entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();

        CacheStats {
            entry_count: keys.len(),
            keys,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Start the periodic sweep. Must be called from within a Tokio runtime.
    ///
    /// Does nothing if the sweep is already running. The task holds only a
    /// weak reference and exits once the cache is dropped. A zero `period`
    /// is replaced by [`DEFAULT_SWEEP_INTERVAL`].
    pub fn start(self: &Arc<Self>, period: Duration) {
        let period = if period.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            period
        };

        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        info!(
            "Starting background cache sweep (interval: {} seconds)",
            period.as_secs()
        );

        let cache: Weak<Self> = Arc::downgrade(self);
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);

            // Skip the first tick (which fires immediately)
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };

                let removed = cache.sweep();
                if removed > 0 {
                    debug!("Cache sweep removed {} expired entries", removed);
                }
            }
        }));
    }

    /// Stop the periodic sweep. Returns whether a sweep was running.
    pub fn stop(&self) -> bool {
        match self.sweeper.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("Stopped background cache sweep");
                true
            }
            None => false,
        }
    }

    /// Whether the periodic sweep is running
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn record(&self, hit: bool) {
        if hit {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("catalog_cache_hits_total").increment(1);
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("catalog_cache_misses_total").increment(1);
        }
    }
}

impl Drop for TtlCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ttl_boundary() {
        let cache = TtlCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(1));

        assert_eq!(cache.get::<String>("k").as_deref(), Some("v"));

        // Still valid exactly at the expiry instant
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<String>("k").as_deref(), Some("v"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get::<String>("k").is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites() {
        let cache = TtlCache::new();
        cache.set("k", 1u32, Duration::from_secs(10));
        cache.set("k", 2u32, Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = TtlCache::new();
        cache.set_default("k", 7u64);

        assert!(cache.get::<String>("k").is_none());
        assert_eq!(cache.get::<u64>("k"), Some(7));

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear_are_idempotent() {
        let cache = TtlCache::new();
        cache.set_default("releases:published", vec![1, 2, 3]);
        cache.set_default("releases:1", 1);
        cache.set_default("artists", 0);

        assert!(cache.delete("artists"));
        assert!(!cache.delete("artists"));

        assert_eq!(cache.delete_prefix("releases:"), 2);
        assert_eq!(cache.delete_prefix("releases:"), 0);

        cache.set_default("a", 1);
        assert_eq!(cache.clear(), 1);
        assert_eq!(cache.clear(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = TtlCache::new();
        cache.set("short", 1, Duration::from_secs(1));
        cache.set("long", 2, Duration::from_secs(3600));

        assert_eq!(cache.sweep(), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.stats().keys, vec!["long".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_lifecycle() {
        let cache = Arc::new(TtlCache::new());
        cache.set("short", 1, Duration::from_secs(1));
        cache.set("long", 2, Duration::from_secs(3600));

        cache.start(DEFAULT_SWEEP_INTERVAL);
        assert!(cache.is_running());

        // Let the interval fire once without reading the keys
        tokio::time::sleep(DEFAULT_SWEEP_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(cache.stats().keys, vec!["long".to_string()]);

        assert!(cache.stop());
        assert!(!cache.stop());
        assert!(!cache.is_running());
    }
}
