//! Read-through orchestration: check the cache, fall back to the network on
//! a miss, write the result back, all cancellable through a single
//! [`RequestToken`].

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Url;
use thiserror::Error;

use crate::cache::{self, Cache, CacheContent};
use crate::concurrency::RequestToken;
use crate::error::{ErrorReporter, TracingErrorReporter};
use crate::key::CacheKey;
use crate::net::{self, ExponentialBackoff, Fetcher, NetworkErrorHandlingStrategy, RetryingTask};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cache(#[from] cache::disk::Error),
    #[error(transparent)]
    Net(#[from] net::Error),
}

/// Where a successful fetch's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
}

/// The result of a successful [`RequestCoordinator::fetch`]: the bytes, plus
/// where they came from.
#[derive(Debug, Clone)]
pub struct UrlRequestResult {
    pub content: CacheContent,
    pub source: Source,
}

/// Policy knobs for a [`RequestCoordinator`]. The cache root and size budget
/// live on the [`crate::cache::DiskCacheConfig`] passed to the cache itself;
/// this config only covers request-level behavior.
#[derive(Clone)]
pub struct CoordinatorConfig {
    pub retry_strategy: Arc<dyn NetworkErrorHandlingStrategy>,
    /// If `true`, a network fetch's completion waits for the cache write to
    /// finish before returning. If `false`, the bytes are returned as soon
    /// as the fetch completes and the store proceeds fire-and-forget.
    pub wait_for_cache_write: bool,
}

impl std::fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("wait_for_cache_write", &self.wait_for_cache_write)
            .finish_non_exhaustive()
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            retry_strategy: Arc::new(ExponentialBackoff::default()),
            wait_for_cache_write: true,
        }
    }
}

/// Ties a [`Cache`] and a [`Fetcher`] together: a cache hit never touches the
/// network; a miss fetches, then writes the bytes back before returning them.
pub struct RequestCoordinator<C, F> {
    cache: Arc<C>,
    fetcher: Arc<F>,
    config: CoordinatorConfig,
    reporter: Arc<dyn ErrorReporter>,
}

impl<C: std::fmt::Debug, F> std::fmt::Debug for RequestCoordinator<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoordinator").field("cache", &self.cache).finish_non_exhaustive()
    }
}

impl<C, F> RequestCoordinator<C, F>
where
    C: Cache + 'static,
    F: Fetcher + 'static,
{
    pub fn new(cache: C, fetcher: F, config: CoordinatorConfig) -> Self {
        RequestCoordinator {
            cache: Arc::new(cache),
            fetcher: Arc::new(fetcher),
            config,
            reporter: Arc::new(TracingErrorReporter),
        }
    }

    /// Resolves `url`'s content, keyed by `key`, cooperatively cancellable
    /// through `token`. A cache hit touches only `Cache::retrieve` — the
    /// network and `token` are never consulted on the hit path.
    pub async fn fetch(
        &self,
        url: &Url,
        key: CacheKey,
        token: Arc<RequestToken>,
    ) -> Result<UrlRequestResult, Error> {
        if let Some(content) = self.cache.retrieve(&key).await? {
            return Ok(UrlRequestResult { content, source: Source::Cache });
        }

        if token.is_cancelled() {
            return Err(Error::Net(net::Error::Cancelled));
        }

        let task = RetryingTask::new(self.fetcher.clone(), self.config.retry_strategy.clone(), token);
        let bytes = task.run(url).await?;
        let content = CacheContent::new(bytes);

        if self.config.wait_for_cache_write {
            self.cache.store(key, content.clone()).await?;
        } else {
            let cache = self.cache.clone();
            let reporter = self.reporter.clone();
            let content_for_store = content.clone();
            tokio::spawn(async move {
                if let Err(err) = cache.store(key, content_for_store).await {
                    reporter.report("fire-and-forget cache write", &err);
                }
            });
        }

        Ok(UrlRequestResult { content, source: Source::Network })
    }

    /// Derives the default cache key for `url` and resolves its content.
    pub async fn fetch_url(&self, url: &Url, token: Arc<RequestToken>) -> Result<UrlRequestResult, Error> {
        let key = CacheKey::derive(url);
        self.fetch(url, key, token).await
    }

    /// Returns the on-disk path of `url`'s cached content, if present,
    /// without touching LRU order or the network.
    pub fn local_url(&self, url: &Url) -> Option<PathBuf> {
        let key = CacheKey::derive(url);
        self.cache.resource_path(&key)
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::disk::Error as CacheError;
    use crate::future::BoxFuture;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Default)]
    struct StubCache {
        store: Mutex<HashMap<CacheKey, CacheContent>>,
    }

    impl Cache for StubCache {
        fn retrieve<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<Option<CacheContent>, CacheError>> {
            let value = self.store.lock().get(key).cloned();
            Box::pin(async move { Ok(value) })
        }

        fn store<'a>(&'a self, key: CacheKey, content: CacheContent) -> BoxFuture<'a, Result<(), CacheError>> {
            self.store.lock().insert(key, content);
            Box::pin(async move { Ok(()) })
        }

        fn remove<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<(), CacheError>> {
            self.store.lock().remove(key);
            Box::pin(async move { Ok(()) })
        }

        fn resource_path(&self, key: &CacheKey) -> Option<PathBuf> {
            self.store.lock().contains_key(key).then(|| PathBuf::from(key.as_str()))
        }
    }

    struct StubFetcher {
        bytes: Vec<u8>,
    }

    impl Fetcher for StubFetcher {
        fn fetch<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, net::Error>> {
            let bytes = self.bytes.clone();
            Box::pin(async move { Ok(bytes) })
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/logo.png").unwrap()
    }

    #[tokio::test]
    async fn miss_fetches_and_populates_cache() {
        let cache = StubCache::default();
        let fetcher = StubFetcher { bytes: vec![1, 2, 3] };
        let coordinator = RequestCoordinator::new(cache, fetcher, CoordinatorConfig::default());

        let result = coordinator
            .fetch_url(&url(), Arc::new(RequestToken::new()))
            .await
            .unwrap();
        assert_eq!(result.content.as_bytes(), &[1, 2, 3]);
        assert_eq!(result.source, Source::Network);

        let key = CacheKey::derive(&url());
        assert!(coordinator.cache().store.lock().contains_key(&key));
    }

    #[tokio::test]
    async fn hit_never_calls_fetcher() {
        struct PanicFetcher;
        impl Fetcher for PanicFetcher {
            fn fetch<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, net::Error>> {
                Box::pin(async { panic!("fetcher should not be called on a cache hit") })
            }
        }

        let cache = StubCache::default();
        let key = CacheKey::derive(&url());
        cache.store.lock().insert(key.clone(), CacheContent::new(vec![9]));

        let coordinator = RequestCoordinator::new(cache, PanicFetcher, CoordinatorConfig::default());
        let result = coordinator.fetch(&url(), key, Arc::new(RequestToken::new())).await.unwrap();
        assert_eq!(result.content.as_bytes(), &[9]);
        assert_eq!(result.source, Source::Cache);
    }

    #[tokio::test]
    async fn cancelled_before_fetch_short_circuits() {
        struct PanicFetcher;
        impl Fetcher for PanicFetcher {
            fn fetch<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<Vec<u8>, net::Error>> {
                Box::pin(async { panic!("fetcher should not run once cancelled") })
            }
        }

        let cache = StubCache::default();
        let coordinator = RequestCoordinator::new(cache, PanicFetcher, CoordinatorConfig::default());
        let token = Arc::new(RequestToken::new());
        token.cancel();

        let result = coordinator.fetch_url(&url(), token).await;
        assert!(matches!(result, Err(Error::Net(net::Error::Cancelled))));
    }

    #[tokio::test]
    async fn wait_for_cache_write_false_returns_before_store_is_observed() {
        let cache = StubCache::default();
        let fetcher = StubFetcher { bytes: vec![4, 5, 6] };
        let config = CoordinatorConfig {
            wait_for_cache_write: false,
            ..CoordinatorConfig::default()
        };
        let coordinator = RequestCoordinator::new(cache, fetcher, config);

        let result = coordinator
            .fetch_url(&url(), Arc::new(RequestToken::new()))
            .await
            .unwrap();
        assert_eq!(result.content.as_bytes(), &[4, 5, 6]);
        assert_eq!(result.source, Source::Network);

        // The fire-and-forget store is not guaranteed to have landed yet,
        // but it must land eventually.
        let key = CacheKey::derive(&url());
        for _ in 0..100 {
            if coordinator.cache().store.lock().contains_key(&key) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("fire-and-forget store never landed");
    }

    #[tokio::test]
    async fn local_url_delegates_to_cache_resource_path() {
        let cache = StubCache::default();
        let fetcher = StubFetcher { bytes: vec![1] };
        let coordinator = RequestCoordinator::new(cache, fetcher, CoordinatorConfig::default());

        assert!(coordinator.local_url(&url()).is_none());
        coordinator
            .fetch_url(&url(), Arc::new(RequestToken::new()))
            .await
            .unwrap();
        assert!(coordinator.local_url(&url()).is_some());
    }
}
