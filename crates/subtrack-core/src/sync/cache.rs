//! Query cache
//!
//! One cache instance per key namespace (lists, details). Entries carry a
//! freshness timestamp; a read inside the staleness window is served from
//! memory, anything else goes back to the remote store. Concurrent readers
//! of the same not-yet-resolved key share a single in-flight fetch.
//!
//! Invalidation marks an entry stale but keeps it servable through
//! [`QueryCache::peek`], so screens can keep showing the old value while the
//! next read re-fetches. Removal deletes the entry outright.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::SyncError;

/// Observable state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Nothing cached and nothing in flight
    Absent,
    /// A fetch is in flight
    Loading,
    /// Cached and inside the staleness window
    Fresh,
    /// Cached but invalidated or past the staleness window
    Stale,
    /// The last fetch for this key failed
    Error,
}

struct Entry<V> {
    value: Option<V>,
    fetched_at: Instant,
    stale: bool,
    error: bool,
}

impl<V> Entry<V> {
    fn fresh(value: V) -> Self {
        Self {
            value: Some(value),
            fetched_at: Instant::now(),
            stale: false,
            error: false,
        }
    }
}

type FetchFuture<V> = Shared<BoxFuture<'static, Result<V, SyncError>>>;

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    inflight: HashMap<String, FetchFuture<V>>,
    /// Bumped on invalidate/remove/clear so a fetch that was already in
    /// flight cannot write back over a newer decision about its key.
    generations: HashMap<String, u64>,
}

impl<V> Inner<V> {
    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    fn bump(&mut self, key: &str) {
        *self.generations.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// A cache of query results for one key namespace
pub struct QueryCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    ttl: Duration,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries stay fresh for `ttl` after a fetch
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                inflight: HashMap::new(),
                generations: HashMap::new(),
            })),
            ttl,
        }
    }

    /// Read through the cache
    ///
    /// Serves the cached value when it is fresh and inside the staleness
    /// window. Otherwise runs `fetch`, retrying once on failure before
    /// surfacing the error. Concurrent callers for the same key await the
    /// same in-flight fetch instead of issuing duplicates; a failed fetch
    /// does not cache a partial result.
    pub async fn fetch_with<F, Fut>(&self, key: &str, fetch: F) -> Result<V, SyncError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, SyncError>> + Send + 'static,
    {
        let shared = {
            let mut inner = self.inner.lock().await;

            if let Some(entry) = inner.entries.get(key) {
                if !entry.stale && !entry.error && entry.fetched_at.elapsed() < self.ttl {
                    if let Some(value) = &entry.value {
                        return Ok(value.clone());
                    }
                }
            }

            if let Some(existing) = inner.inflight.get(key) {
                existing.clone()
            } else {
                let generation = inner.generation(key);
                let state = Arc::clone(&self.inner);
                let key_owned = key.to_string();

                let fut = async move {
                    let result = match fetch().await {
                        Ok(value) => Ok(value),
                        Err(first) => {
                            debug!(key = %key_owned, "fetch failed, retrying once: {}", first);
                            fetch().await
                        }
                    };

                    let mut inner = state.lock().await;
                    inner.inflight.remove(&key_owned);

                    // The key may have been invalidated or removed while we
                    // were suspended; in that case the result is stale before
                    // it lands, so skip the write and let the next read miss.
                    if inner.generation(&key_owned) == generation {
                        match &result {
                            Ok(value) => {
                                inner
                                    .entries
                                    .insert(key_owned.clone(), Entry::fresh(value.clone()));
                            }
                            Err(_) => {
                                if let Some(entry) = inner.entries.get_mut(&key_owned) {
                                    entry.error = true;
                                } else {
                                    inner.entries.insert(
                                        key_owned.clone(),
                                        Entry {
                                            value: None,
                                            fetched_at: Instant::now(),
                                            stale: true,
                                            error: true,
                                        },
                                    );
                                }
                            }
                        }
                    }

                    result
                }
                .boxed()
                .shared();

                inner.inflight.insert(key.to_string(), fut.clone());
                fut
            }
        };

        shared.await
    }

    /// The cached value for `key`, fresh or stale, without fetching
    pub async fn peek(&self, key: &str) -> Option<V> {
        let inner = self.inner.lock().await;
        inner.entries.get(key).and_then(|e| e.value.clone())
    }

    /// Observable state of the entry for `key`
    pub async fn state(&self, key: &str) -> EntryState {
        let inner = self.inner.lock().await;
        if inner.inflight.contains_key(key) {
            return EntryState::Loading;
        }
        match inner.entries.get(key) {
            None => EntryState::Absent,
            Some(e) if e.error => EntryState::Error,
            Some(e) if e.value.is_none() => EntryState::Absent,
            Some(e) if e.stale || e.fetched_at.elapsed() >= self.ttl => EntryState::Stale,
            Some(_) => EntryState::Fresh,
        }
    }

    /// Mark the entry for `key` stale; it stays servable via `peek` but the
    /// next read re-fetches
    pub async fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.bump(key);
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.stale = true;
        }
    }

    /// Mark every entry in this namespace stale
    pub async fn invalidate_all(&self) {
        let mut inner = self.inner.lock().await;
        let keys: Vec<String> = inner
            .entries
            .keys()
            .chain(inner.inflight.keys())
            .cloned()
            .collect();
        for key in keys {
            inner.bump(&key);
        }
        for entry in inner.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Delete the entry for `key`; the next read behaves as a fresh miss
    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.bump(key);
        inner.entries.remove(key);
    }

    /// Drop every entry (teardown on logout)
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        let keys: Vec<String> = inner
            .entries
            .keys()
            .chain(inner.inflight.keys())
            .cloned()
            .collect();
        for key in keys {
            inner.bump(&key);
        }
        inner.entries.clear();
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        calls: Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl Fn() -> BoxFuture<'static, Result<String, SyncError>> + Send + Sync + 'static {
        move || {
            let calls = Arc::clone(&calls);
            let value = value.to_string();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // Yield so concurrent callers can pile onto the same key
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_serves_cached() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let v1 = cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        let v2 = cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();

        assert_eq!(v1, "a");
        assert_eq!(v2, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state("k").await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_coalesce() {
        let cache: Arc<QueryCache<String>> = Arc::new(QueryCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache.fetch_with("k", counting_fetch(calls, "a")).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "a");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_staleness_window_expiry() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_millis(20));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        assert_eq!(cache.state("k").await, EntryState::Fresh);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.state("k").await, EntryState::Stale);

        cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_keeps_peek_but_refetches() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        cache.invalidate("k").await;

        // Still servable for the UI
        assert_eq!(cache.peek("k").await.as_deref(), Some("a"));
        assert_eq!(cache.state("k").await, EntryState::Stale);

        // Next read goes back to the store
        cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state("k").await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_remove_is_a_miss() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch_with("k", counting_fetch(Arc::clone(&calls), "a"))
            .await
            .unwrap();
        cache.remove("k").await;

        assert_eq!(cache.peek("k").await, None);
        assert_eq!(cache.state("k").await, EntryState::Absent);
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in = Arc::clone(&calls);
        let value = cache
            .fetch_with("k", move || {
                let calls = Arc::clone(&calls_in);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(SyncError::RemoteUnavailable("first attempt".to_string()))
                    } else {
                        Ok("a".to_string())
                    }
                }
                .boxed()
            })
            .await
            .unwrap();

        assert_eq!(value, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state("k").await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_both_attempts_fail_surfaces_error() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in = Arc::clone(&calls);
        let result = cache
            .fetch_with("k", move || {
                let calls = Arc::clone(&calls_in);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(SyncError::RemoteUnavailable("down".to_string()))
                }
                .boxed()
            })
            .await;

        assert_eq!(
            result,
            Err(SyncError::RemoteUnavailable("down".to_string()))
        );
        // Exactly one retry
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // No partial result cached
        assert_eq!(cache.peek("k").await, None);
        assert_eq!(cache.state("k").await, EntryState::Error);
    }

    #[tokio::test]
    async fn test_invalidate_during_flight_discards_write() {
        let cache: Arc<QueryCache<String>> = Arc::new(QueryCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let fetcher = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move { cache.fetch_with("k", counting_fetch(calls, "a")).await })
        };

        // Let the fetch get in flight, then invalidate the key under it
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.invalidate("k").await;

        // The caller still gets its result
        assert_eq!(fetcher.await.unwrap().unwrap(), "a");
        // but the cache does not treat it as fresh
        assert_ne!(cache.state("k").await, EntryState::Fresh);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch_with("a", counting_fetch(Arc::clone(&calls), "x"))
            .await
            .unwrap();
        cache
            .fetch_with("b", counting_fetch(Arc::clone(&calls), "y"))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.state("a").await, EntryState::Absent);
    }

    #[tokio::test]
    async fn test_invalidate_all_marks_namespace_stale() {
        let cache: QueryCache<String> = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch_with("a", counting_fetch(Arc::clone(&calls), "x"))
            .await
            .unwrap();
        cache
            .fetch_with("b", counting_fetch(Arc::clone(&calls), "y"))
            .await
            .unwrap();

        cache.invalidate_all().await;
        assert_eq!(cache.state("a").await, EntryState::Stale);
        assert_eq!(cache.state("b").await, EntryState::Stale);
        // Values survive for the UI
        assert_eq!(cache.peek("a").await.as_deref(), Some("x"));
    }
}
