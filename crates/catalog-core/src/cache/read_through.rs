//! Memoize-on-miss wrapper around asynchronous reads

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::store::TtlCache;

impl TtlCache {
    /// Return the cached value for `key`, or run `producer` and cache its
    /// result for `ttl`
    ///
    /// On a hit the producer is never invoked. On a miss it is invoked
    /// exactly once; an `Err` is returned as-is and nothing is cached.
    ///
    /// Concurrent misses on the same key are not coalesced: each caller runs
    /// its own producer and the last one to finish wins the slot.
    ///
    /// A zero `ttl` disables caching for the call: the producer always runs
    /// and its result is not stored.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Duration,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if ttl.is_zero() {
            return producer().await;
        }

        if let Some(value) = self.get::<T>(key) {
            debug!("Cache hit: {}", key);
            return Ok(value);
        }

        debug!("Cache miss: {}", key);
        let value = producer().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = TtlCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let produce = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec!["release".to_string()])
        };

        let first = cache.with_cache("published", produce, TTL).await.unwrap();
        let second = cache.with_cache("published", produce, TTL).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_producer_is_not_cached() {
        let cache = TtlCache::new();

        let err = cache
            .with_cache("k", || async { Err::<u32, _>("backend down") }, TTL)
            .await
            .unwrap_err();
        assert_eq!(err, "backend down");
        assert_eq!(cache.stats().entry_count, 0);

        let value = cache
            .with_cache("k", || async { Ok::<_, &str>(5u32) }, TTL)
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_hit_skips_failing_producer() {
        let cache = TtlCache::new();
        cache.set("k", 1u32, TTL);

        let value = cache
            .with_cache("k", || async { Err::<u32, _>("must not run") }, TTL)
            .await
            .unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_bypasses_cache() {
        let cache = TtlCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            cache
                .with_cache(
                    "dev",
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, ()>(0u8)
                    },
                    Duration::ZERO,
                )
                .await
                .unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_value_is_recomputed() {
        let cache = TtlCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let produce = move || async move { Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst)) };

        assert_eq!(cache.with_cache("k", produce, Duration::from_secs(1)).await, Ok(0));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.with_cache("k", produce, Duration::from_secs(1)).await, Ok(1));
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_run_producer() {
        let cache = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Barrier::new(2));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let cache = cache.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .with_cache(
                        "race",
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Both callers are past their cache lookup here
                            gate.wait().await;
                            Ok::<_, ()>(1u8)
                        },
                        TTL,
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().entry_count, 1);
    }
}
