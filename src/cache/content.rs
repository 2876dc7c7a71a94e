//! Content Cache Module
//!
//! Caches origin content under a TTL and counts every fetch per url.
//!
//! # Key layout
//! - `content:<url>` - cached body, written with an expiry
//! - `count:<url>` - number of fetches of `<url>`, hits and misses alike

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::read_counter;
use crate::cache::stats::{FetchStats, StatsRecorder};
use crate::config::{Config, DEFAULT_CONTENT_TTL};
use crate::error::{CacheError, Result};
use crate::origin::OriginFetch;
use crate::store::KeyValueStore;

/// Prefix of cached content keys.
pub const CONTENT_PREFIX: &str = "content:";

/// Prefix of access counter keys.
pub const COUNT_PREFIX: &str = "count:";

// == Content Cache ==
/// Read-through cache in front of an origin.
///
/// Expiry is left to the store: an entry past its TTL reads as absent and
/// the next fetch goes back to the origin.
#[derive(Debug)]
pub struct ContentCache<S> {
    store: Arc<S>,
    ttl: Duration,
    stats: StatsRecorder,
}

impl<S: KeyValueStore> ContentCache<S> {
    // == Constructors ==
    /// Creates a cache with the default 10 second TTL.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_ttl(store, Duration::from_secs(DEFAULT_CONTENT_TTL))
    }

    /// Creates a cache whose entries live for `ttl`.
    pub fn with_ttl(store: Arc<S>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            stats: StatsRecorder::default(),
        }
    }

    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        Self::with_ttl(store, config.content_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Fetch ==
    /// Returns the content of `url`, from the cache when a live entry exists,
    /// otherwise from `origin`.
    ///
    /// The access counter of `url` is incremented on every call. A failing
    /// origin propagates its error and nothing is cached.
    pub async fn fetch<O>(&self, url: &str, origin: &O) -> Result<String>
    where
        O: OriginFetch + ?Sized,
    {
        let accesses = self.store.increment(&count_key(url)).await?;
        let key = content_key(url);

        if let Some(raw) = self.store.get(&key).await? {
            self.stats.record_hit();
            debug!(url, accesses, "Content cache hit");
            return String::from_utf8(raw)
                .map_err(|e| CacheError::decode(&key, e.as_bytes(), e.utf8_error().to_string()));
        }

        self.stats.record_miss();
        debug!(url, accesses, "Content cache miss");

        let content = origin.fetch(url).await.map_err(|e| {
            self.stats.record_origin_error();
            warn!(url, error = %e, "Origin fetch failed");
            e
        })?;

        self.store
            .set_with_expiry(&key, content.clone().into_bytes(), self.ttl)
            .await?;
        Ok(content)
    }

    // == Access Count ==
    /// Returns how many times `url` has been fetched.
    pub async fn access_count(&self, url: &str) -> Result<u64> {
        read_counter(self.store.as_ref(), &count_key(url)).await
    }

    // == Stats ==
    /// Returns hit/miss statistics for this cache instance.
    pub fn stats(&self) -> FetchStats {
        self.stats.snapshot()
    }
}

fn content_key(url: &str) -> String {
    format!("{CONTENT_PREFIX}{url}")
}

fn count_key(url: &str) -> String {
    format!("{COUNT_PREFIX}{url}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::FnOrigin;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "http://slowwly.example/page";

    /// Origin returning `body-<n>` where n counts its invocations.
    fn counting_origin(calls: Arc<AtomicUsize>) -> impl OriginFetch {
        FnOrigin::new(move |_: &str| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("body-{n}"))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_within_ttl_hits_cache() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let origin = counting_origin(calls.clone());

        let first = cache.fetch(URL, &origin).await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        let second = cache.fetch(URL, &origin).await.unwrap();

        assert_eq!(first, "body-1");
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.access_count(URL).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_after_ttl_refetches() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let origin = counting_origin(calls.clone());

        assert_eq!(cache.fetch(URL, &origin).await.unwrap(), "body-1");
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.fetch(URL, &origin).await.unwrap(), "body-2");
        assert_eq!(cache.fetch(URL, &origin).await.unwrap(), "body-2");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.access_count(URL).await.unwrap(), 3);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let cache = ContentCache::with_ttl(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let origin = counting_origin(calls.clone());

        cache.fetch(URL, &origin).await.unwrap();
        tokio::time::advance(Duration::from_millis(1001)).await;
        cache.fetch(URL, &origin).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_access_count_unknown_url_is_zero() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.access_count("http://never").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counters_are_per_url() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        let origin = FnOrigin::new(|url: &str| Ok(url.to_uppercase()));

        assert_eq!(cache.fetch("http://a", &origin).await.unwrap(), "HTTP://A");
        assert_eq!(cache.fetch("http://b", &origin).await.unwrap(), "HTTP://B");
        cache.fetch("http://a", &origin).await.unwrap();

        assert_eq!(cache.access_count("http://a").await.unwrap(), 2);
        assert_eq!(cache.access_count("http://b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_origin_failure_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let cache = ContentCache::new(store.clone());
        let failing = FnOrigin::new(|_: &str| Err("503 Service Unavailable".to_string()));

        let result = cache.fetch(URL, &failing).await;
        assert!(matches!(result, Err(CacheError::Fetch { .. })));

        assert_eq!(store.get(&content_key(URL)).await.unwrap(), None);
        assert_eq!(cache.access_count(URL).await.unwrap(), 1);
        assert_eq!(cache.stats().origin_errors, 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let origin = counting_origin(calls.clone());
        assert_eq!(cache.fetch(URL, &origin).await.unwrap(), "body-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_is_byte_identical() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        let body = "<html>\n  <p>ünïcødé</p>\r\n</html>";
        let origin = FnOrigin::new(move |_: &str| Ok(body.to_string()));

        let first = cache.fetch(URL, &origin).await.unwrap();
        let second = cache.fetch(URL, &origin).await.unwrap();

        assert_eq!(first, body);
        assert_eq!(second.as_bytes(), body.as_bytes());
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_dyn_origin() {
        let cache = ContentCache::new(Arc::new(MemoryStore::new()));
        let origin: Box<dyn OriginFetch> = Box::new(FnOrigin::new(|_: &str| Ok("dyn".to_string())));

        assert_eq!(cache.fetch(URL, origin.as_ref()).await.unwrap(), "dyn");
    }
}
