//! Time-boxed page cache with a per-URL request counter
//!
//! Every `get_page` call bumps `count:<url>`. A response cached under
//! `cached:<url>` is returned as-is until the store expires it; after that
//! the next call fetches again.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::fetch::{Fetch, HttpFetcher};
use crate::config::DEFAULT_PAGE_TTL;
use crate::error::Result;
use crate::store::Store;

/// Key holding the number of `get_page` calls for `url`
pub fn count_key(url: &str) -> String {
    format!("count:{}", url)
}

/// Key holding the cached body of `url`
pub fn cached_key(url: &str) -> String {
    format!("cached:{}", url)
}

/// Wraps a [`Fetch`] with a short-lived cache in the given store
pub struct PageCache<F = HttpFetcher> {
    store: Arc<dyn Store>,
    fetcher: F,
    ttl: Duration,
}

impl PageCache<HttpFetcher> {
    /// Creates a page cache that fetches over HTTP
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_fetcher(store, HttpFetcher::new())
    }
}

impl<F: Fetch> PageCache<F> {
    /// Creates a page cache around a custom fetcher
    pub fn with_fetcher(store: Arc<dyn Store>, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            ttl: DEFAULT_PAGE_TTL,
        }
    }

    /// Overrides how long fetched pages stay cached
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the page at `url`, fetching it only when no cached copy exists
    ///
    /// The request counter is incremented on hits and misses alike. An
    /// empty cached body is treated as a miss.
    pub async fn get_page(&self, url: &str) -> Result<String> {
        let count = self.store.incr(&count_key(url), 1).await?;

        let key = cached_key(url);
        if let Some(bytes) = self.store.get(&key).await?.filter(|b| !b.is_empty()) {
            debug!(url, count, "Page cache hit");
            return Ok(String::from_utf8(bytes)?);
        }

        debug!(url, count, "Page cache miss");
        let html = self.fetcher.fetch(url).await?;
        self.store.set_ex(&key, html.as_bytes(), self.ttl).await?;
        Ok(html)
    }

    /// Number of `get_page` calls made for `url`
    pub async fn request_count(&self, url: &str) -> Result<i64> {
        let Some(bytes) = self.store.get(&count_key(url)).await? else {
            return Ok(0);
        };
        Ok(String::from_utf8(bytes)?.parse::<i64>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "http://www.example.com/";

    /// Fetcher that counts how often it was called
    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        body: String,
    }

    #[async_trait]
    impl Fetch for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{} #{}", self.body, n))
        }
    }

    fn create_test_cache(
        body: &str,
    ) -> (PageCache<CountingFetcher>, Arc<MemoryStore>, Arc<AtomicUsize>) {
        let store = Arc::new(MemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = CountingFetcher {
            calls: Arc::clone(&calls),
            body: body.to_string(),
        };
        let cache = PageCache::with_fetcher(store.clone(), fetcher);
        (cache, store, calls)
    }

    #[test]
    fn test_keys() {
        assert_eq!(count_key("http://a.test"), "count:http://a.test");
        assert_eq!(cached_key("http://a.test"), "cached:http://a.test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let (cache, _store, calls) = create_test_cache("<html>");

        let first = cache.get_page(URL).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = cache.get_page(URL).await.unwrap();

        assert_eq!(first, "<html> #1");
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.request_count(URL).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_again_after_expiry() {
        let (cache, _store, calls) = create_test_cache("<html>");

        cache.get_page(URL).await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        let page = cache.get_page(URL).await.unwrap();

        assert_eq!(page, "<html> #2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.request_count(URL).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_does_not_expire() {
        let (cache, store, _calls) = create_test_cache("<html>");

        cache.get_page(URL).await.unwrap();
        tokio::time::advance(Duration::from_secs(3600)).await;

        assert!(!store.exists(&cached_key(URL)).await.unwrap());
        assert_eq!(cache.request_count(URL).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let (cache, _store, calls) = create_test_cache("<p>");
        let cache = cache.with_ttl(Duration::from_secs(60));
        assert_eq!(cache.ttl(), Duration::from_secs(60));

        cache.get_page(URL).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.get_page(URL).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_urls_are_cached_independently() {
        let (cache, _store, calls) = create_test_cache("<html>");

        cache.get_page("http://a.test").await.unwrap();
        cache.get_page("http://b.test").await.unwrap();
        cache.get_page("http://a.test").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.request_count("http://a.test").await.unwrap(), 2);
        assert_eq!(cache.request_count("http://b.test").await.unwrap(), 1);
        assert_eq!(cache.request_count("http://c.test").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_cached_body_is_refetched() {
        let (cache, store, calls) = create_test_cache("<html>");
        store
            .set_ex(&cached_key(URL), b"", Duration::from_secs(10))
            .await
            .unwrap();

        let page = cache.get_page(URL).await.unwrap();
        assert_eq!(page, "<html> #1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
