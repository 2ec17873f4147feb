//! crates/comic_courier_core/src/cache.rs
//!
//! The cached comic lookup service. A store-backed cache sits in front of the
//! upstream comic source so that any comic number is fetched from upstream at
//! most once; concurrent requests for the same uncached number coalesce onto
//! a single in-flight fetch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::Comic;
use crate::ports::{ComicSource, ComicStore, PortResult};

/// Store-backed comic cache with per-number single-flight fetching.
///
/// Lookups check the store first and only contact the upstream source on a
/// miss. While a fetch for a number is in flight, later callers for the same
/// number wait on its lock and are answered from the store once the leader
/// has persisted the result.
pub struct ComicCache {
    source: Arc<dyn ComicSource>,
    store: Arc<dyn ComicStore>,
    /// One lock per comic number currently being fetched.
    inflight: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl ComicCache {
    /// Creates a new `ComicCache` over the given source and store.
    pub fn new(source: Arc<dyn ComicSource>, store: Arc<dyn ComicStore>) -> Self {
        Self {
            source,
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the comic with this number, fetching and persisting it on a
    /// cache miss.
    ///
    /// Upstream failures propagate unchanged and nothing is cached for the
    /// failed number; a later call will attempt the fetch again.
    pub async fn get_or_fetch(&self, num: i32) -> PortResult<Comic> {
        if let Some(comic) = self.store.comic(num).await? {
            debug!(num, "comic cache hit");
            return Ok(comic);
        }

        let entry = self.claim(num).await;
        let guard = entry.lock().await;

        let result = async {
            // Re-check: the leader we waited on may have populated the store.
            if let Some(comic) = self.store.comic(num).await? {
                debug!(num, "comic cache hit after awaiting in-flight fetch");
                return Ok(comic);
            }

            debug!(num, "comic cache miss, fetching from upstream");
            let metadata = self.source.comic_by_number(num).await?;
            let comic = metadata.fetched_at(Utc::now());
            self.store.insert_comic(&comic).await?;
            Ok(comic)
        }
        .await;

        drop(guard);
        self.release(num, &entry).await;
        result
    }

    /// The in-flight lock for `num`, created on first use.
    async fn claim(&self, num: i32) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight
            .entry(num)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the in-flight lock for `num`, but only the generation this
    /// caller claimed: a newer entry belongs to a later fetch.
    async fn release(&self, num: i32, entry: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        if inflight
            .get(&num)
            .map_or(false, |current| Arc::ptr_eq(current, entry))
        {
            inflight.remove(&num);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComicMetadata;
    use crate::ports::{ComicSource, ComicStore, PortError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Upstream fake: serves synthetic metadata for any number, counting
    /// calls and optionally sleeping so concurrent callers pile up.
    struct StubSource {
        calls: AtomicUsize,
        delay: Duration,
        fail: AtomicBool,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(0),
                fail: AtomicBool::new(false),
            }
        }

        fn slow(delay_ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(delay_ms),
                ..Self::new()
            }
        }

        fn fetch_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ComicSource for StubSource {
        async fn latest_comic_number(&self) -> PortResult<i32> {
            Ok(3000)
        }

        async fn comic_by_number(&self, num: i32) -> PortResult<ComicMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortError::UpstreamUnavailable("stub offline".into()));
            }
            Ok(ComicMetadata {
                num,
                title: format!("comic {num}"),
                img: format!("https://example.com/{num}.png"),
                alt: format!("alt {num}"),
            })
        }
    }

    /// In-memory `ComicStore`, optionally refusing writes.
    #[derive(Default)]
    struct MemoryStore {
        comics: StdMutex<HashMap<i32, Comic>>,
        refuse_writes: bool,
    }

    impl MemoryStore {
        fn len(&self) -> usize {
            self.comics.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ComicStore for MemoryStore {
        async fn comic(&self, num: i32) -> PortResult<Option<Comic>> {
            Ok(self.comics.lock().unwrap().get(&num).cloned())
        }

        async fn insert_comic(&self, comic: &Comic) -> PortResult<()> {
            if self.refuse_writes {
                return Err(PortError::Unexpected("store refused the write".into()));
            }
            self.comics
                .lock()
                .unwrap()
                .entry(comic.num)
                .or_insert_with(|| comic.clone());
            Ok(())
        }

        async fn explanation(&self, _num: i32) -> PortResult<Option<crate::domain::Explanation>> {
            Ok(None)
        }
    }

    fn cache_over(source: Arc<StubSource>, store: Arc<MemoryStore>) -> ComicCache {
        ComicCache::new(source, store)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_store() {
        let source = Arc::new(StubSource::new());
        let store = Arc::new(MemoryStore::default());
        let cache = cache_over(source.clone(), store.clone());

        let first = cache.get_or_fetch(614).await.unwrap();
        let second = cache.get_or_fetch(614).await.unwrap();

        assert_eq!(source.fetch_count(), 1, "second lookup must not hit upstream");
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce_to_one_fetch() {
        let source = Arc::new(StubSource::slow(30));
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(cache_over(source.clone(), store.clone()));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move { cache.get_or_fetch(927).await }));
        }
        for task in tasks {
            let comic = task.await.unwrap().unwrap();
            assert_eq!(comic.num, 927);
        }

        assert_eq!(source.fetch_count(), 1, "concurrent misses must share one fetch");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_numbers_fetch_independently() {
        let source = Arc::new(StubSource::new());
        let store = Arc::new(MemoryStore::default());
        let cache = cache_over(source.clone(), store.clone());

        cache.get_or_fetch(1).await.unwrap();
        cache.get_or_fetch(2).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates_and_caches_nothing() {
        let source = Arc::new(StubSource::new());
        source.fail.store(true, Ordering::SeqCst);
        let store = Arc::new(MemoryStore::default());
        let cache = cache_over(source.clone(), store.clone());

        match cache.get_or_fetch(404).await {
            Err(PortError::UpstreamUnavailable(_)) => {}
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
        assert_eq!(store.len(), 0, "a failed fetch must cache nothing");

        // The number is not poisoned: once upstream recovers, it fetches.
        source.fail.store(false, Ordering::SeqCst);
        let comic = cache.get_or_fetch(404).await.unwrap();
        assert_eq!(comic.num, 404);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_store_write_failure_surfaces_to_the_caller() {
        let source = Arc::new(StubSource::new());
        let store = Arc::new(MemoryStore {
            refuse_writes: true,
            ..MemoryStore::default()
        });
        let cache = cache_over(source.clone(), store.clone());

        assert!(matches!(
            cache.get_or_fetch(5).await,
            Err(PortError::Unexpected(_))
        ));
        assert_eq!(store.len(), 0);
    }
}
