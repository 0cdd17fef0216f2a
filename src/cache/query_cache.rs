// src/cache/query_cache.rs
//
// Query cache with request de-duplication and invalidation.
//
// DESIGN PRINCIPLES:
// 1. A fresh entry is served without calling its fetcher
// 2. Identical concurrent fetches share one in-flight call and one result
// 3. Invalidation marks stale; a result already in flight is not stored
// 4. Observed entries refetch in the background after invalidation
// 5. The entry lock is never held across an await

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::query_key::{QueryData, QueryKey};
use crate::error::{AppError, AppResult};

/// Produces the remote call backing a query. Kept per entry so the cache
/// can refetch in the background.
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, AppResult<QueryData>> + Send + Sync>;

type FetchResult = Result<Arc<QueryData>, Arc<AppError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct CacheEntry {
    data: Option<Arc<QueryData>>,
    stale: bool,
    fetched_at: Option<DateTime<Utc>>,
    in_flight: Option<InFlight>,
    fetcher: Option<Fetcher>,
    watchers: watch::Sender<Option<Arc<QueryData>>>,
}

impl CacheEntry {
    fn new() -> Self {
        let (watchers, _) = watch::channel(None);
        Self {
            data: None,
            stale: false,
            fetched_at: None,
            in_flight: None,
            fetcher: None,
            watchers,
        }
    }

    fn fresh_data(&self) -> Option<Arc<QueryData>> {
        match (&self.data, self.stale) {
            (Some(data), false) => Some(Arc::clone(data)),
            _ => None,
        }
    }

    fn store(&mut self, data: Arc<QueryData>) {
        self.data = Some(Arc::clone(&data));
        self.stale = false;
        self.fetched_at = Some(Utc::now());
        self.watchers.send_replace(Some(data));
    }
}

/// Snapshot of a cache entry
#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub data: Arc<QueryData>,
    pub stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    next_fetch_id: AtomicU64,
}

/// Cloneable handle; clones share the same entries.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        let mut keys: Vec<String> = entries.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("QueryCache").field("keys", &keys).finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key`, fresh or stale.
    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        let data = entry.data.as_ref()?;
        Some(CachedQuery {
            data: Arc::clone(data),
            stale: entry.stale,
            fetched_at: entry.fetched_at,
        })
    }

    /// Store `data` as the fresh value for `key`. A fetch already in flight
    /// for the key will not overwrite it.
    pub fn set(&self, key: QueryKey, data: QueryData) {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        entry.in_flight = None;
        entry.store(Arc::new(data));
        log::debug!("cache set {}", key);
    }

    /// Mark `key` stale. Returns false when nothing was cached for it.
    ///
    /// If the key has observers and a known fetcher, a background refetch
    /// is spawned on the current tokio runtime.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let refetch = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                log::debug!("invalidate {}: not cached", key);
                return false;
            };
            entry.stale = true;
            entry.in_flight = None;

            if entry.watchers.receiver_count() > 0 {
                entry.fetcher.clone()
            } else {
                None
            }
        };

        log::debug!("invalidated {}", key);
        if let Some(fetcher) = refetch {
            self.spawn_refetch(key.clone(), fetcher);
        }
        true
    }

    /// Drop the entry entirely. Observers see their channel close.
    pub fn remove(&self, key: &QueryKey) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Subscribe to value changes of `key`.
    pub fn observe(&self, key: QueryKey) -> QueryObserver {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
        QueryObserver {
            receiver: entry.watchers.subscribe(),
            key,
        }
    }

    /// Return the fresh cached value for `key`, or run `fetcher` to get one.
    ///
    /// Callers arriving while a fetch for the same key is in flight await
    /// that fetch instead of starting another, and receive its result,
    /// failures included.
    pub async fn fetch(&self, key: QueryKey, fetcher: Fetcher) -> AppResult<Arc<QueryData>> {
        let (fetch_id, future) = {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_insert_with(CacheEntry::new);
            entry.fetcher = Some(Arc::clone(&fetcher));

            if let Some(data) = entry.fresh_data() {
                log::debug!("cache hit {}", key);
                return Ok(data);
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    log::debug!("joining in-flight fetch of {}", key);
                    (in_flight.id, in_flight.future.clone())
                }
                None => {
                    log::debug!("cache miss {}, fetching", key);
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let future = fetcher()
                        .map(|result| result.map(Arc::new).map_err(Arc::new))
                        .boxed()
                        .shared();
                    entry.in_flight = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;
        self.complete(&key, fetch_id, &result);
        result.map_err(AppError::from_shared)
    }

    /// Store the outcome of fetch `fetch_id` if it is still the entry's
    /// current fetch. Later completions of the same shared fetch are no-ops.
    fn complete(&self, key: &QueryKey, fetch_id: u64, result: &FetchResult) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        let current = matches!(&entry.in_flight, Some(f) if f.id == fetch_id);
        if !current {
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(data) => entry.store(Arc::clone(data)),
            Err(err) => log::warn!("fetch of {} failed: {}", key, err),
        }
    }

    fn spawn_refetch(&self, key: QueryKey, fetcher: Fetcher) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                handle.spawn(async move {
                    if let Err(err) = cache.fetch(key.clone(), fetcher).await {
                        log::warn!("background refetch of {} failed: {}", key, err);
                    }
                });
            }
            Err(_) => log::debug!("no runtime, {} will refetch on next read", key),
        }
    }
}

/// Receives every value stored for one key
pub struct QueryObserver {
    key: QueryKey,
    receiver: watch::Receiver<Option<Arc<QueryData>>>,
}

impl QueryObserver {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest stored value, if any.
    pub fn current(&self) -> Option<Arc<QueryData>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next stored value. `None` once the entry is removed.
    pub async fn changed(&mut self) -> Option<Arc<QueryData>> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }
}

impl fmt::Debug for QueryObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryObserver").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Movie, MovieId};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn movie(n: usize) -> Movie {
        Movie {
            id: MovieId::new(format!("m{}", n)),
            title: format!("Movie {}", n),
            director: "Someone".to_string(),
            year: 2000,
            genre: String::new(),
            rating: 5.0,
            description: String::new(),
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Each call bumps the counter before doing any work and returns a list
    /// tagged with the call number.
    fn counting_fetcher(calls: Arc<AtomicUsize>, delay: Duration) -> Fetcher {
        Arc::new(move || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(QueryData::Movies(vec![movie(n)]))
            }
            .boxed()
        })
    }

    fn failing_fetcher(calls: Arc<AtomicUsize>, delay: Duration) -> Fetcher {
        Arc::new(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Err(AppError::Remote {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            }
            .boxed()
        })
    }

    fn first_title(data: &QueryData) -> String {
        data.as_movies().unwrap()[0].title.clone()
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::ZERO);

        let first = cache.fetch(QueryKey::AllMovies, fetcher.clone()).await.unwrap();
        let second = cache.fetch(QueryKey::AllMovies, fetcher).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::ZERO);

        cache.fetch(QueryKey::AllMovies, fetcher.clone()).await.unwrap();
        assert!(cache.invalidate(&QueryKey::AllMovies));
        assert!(cache.get(&QueryKey::AllMovies).unwrap().stale);

        let data = cache.fetch(QueryKey::AllMovies, fetcher).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first_title(&data), "Movie 2");
        assert!(!cache.get(&QueryKey::AllMovies).unwrap().stale);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key_is_noop() {
        let cache = QueryCache::new();
        assert!(!cache.invalidate(&QueryKey::movie("nothing")));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_call() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::from_millis(50));

        let (a, b) = tokio::join!(
            cache.fetch(QueryKey::AllMovies, fetcher.clone()),
            cache.fetch(QueryKey::AllMovies, fetcher.clone()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_concurrent_failure_reaches_every_caller_once() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = failing_fetcher(Arc::clone(&calls), Duration::from_millis(20));

        let (a, b) = tokio::join!(
            cache.fetch(QueryKey::AllMovies, fetcher.clone()),
            cache.fetch(QueryKey::AllMovies, fetcher.clone()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b) = (a.unwrap_err(), b.unwrap_err());
        assert_eq!(a.kind(), crate::error::ErrorKind::RemoteFailure);
        assert_eq!(b.kind(), crate::error::ErrorKind::RemoteFailure);
        assert!(cache.get(&QueryKey::AllMovies).is_none());

        // A failed fetch is not cached: the next read tries again.
        let _ = cache.fetch(QueryKey::AllMovies, fetcher).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::ZERO);

        cache.fetch(QueryKey::movie("a"), fetcher.clone()).await.unwrap();
        cache.fetch(QueryKey::movie("b"), fetcher.clone()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.invalidate(&QueryKey::movie("a"));
        cache.fetch(QueryKey::movie("b"), fetcher).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_result_of_invalidated_fetch_is_not_stored() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::from_millis(50));

        let in_flight = {
            let cache = cache.clone();
            let fetcher = fetcher.clone();
            tokio::spawn(async move { cache.fetch(QueryKey::AllMovies, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate(&QueryKey::AllMovies);

        let old = in_flight.await.unwrap().unwrap();
        assert_eq!(first_title(&old), "Movie 1");
        assert!(cache.get(&QueryKey::AllMovies).is_none());

        let fresh = cache.fetch(QueryKey::AllMovies, fetcher).await.unwrap();
        assert_eq!(first_title(&fresh), "Movie 2");
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = QueryCache::new();
        assert!(cache.get(&QueryKey::movie("m1")).is_none());

        cache.set(QueryKey::movie("m1"), QueryData::Movie(movie(1)));

        let cached = cache.get(&QueryKey::movie("m1")).unwrap();
        assert!(!cached.stale);
        assert!(cached.fetched_at.is_some());
        assert_eq!(cached.data.as_movie().unwrap().title, "Movie 1");
    }

    #[tokio::test]
    async fn test_observed_key_refetches_in_background() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::ZERO);

        cache.fetch(QueryKey::AllMovies, fetcher).await.unwrap();
        let mut observer = cache.observe(QueryKey::AllMovies);
        assert_eq!(first_title(&observer.current().unwrap()), "Movie 1");

        cache.invalidate(&QueryKey::AllMovies);

        let updated = tokio::time::timeout(Duration::from_secs(1), observer.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first_title(&updated), "Movie 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unobserved_key_waits_for_next_read() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&calls), Duration::ZERO);

        cache.fetch(QueryKey::AllMovies, fetcher).await.unwrap();
        cache.invalidate(&QueryKey::AllMovies);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remove_closes_observers() {
        let cache = QueryCache::new();
        let mut observer = cache.observe(QueryKey::movie("m1"));

        cache.remove(&QueryKey::movie("m1"));

        assert!(observer.changed().await.is_none());
    }
}
