use crate::config::{CachePolicy, LoaderConfig};
use crate::dispatch::CallbackQueue;
use futures::StreamExt;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use url::Url;

use super::converter::FeedConverter;
use super::error::{LoadResult, LoadingError};

type ResponseCache = Mutex<LruCache<String, Arc<[u8]>>>;

/// Errors that can occur while constructing a [`PodcastFeedLoader`].
#[derive(Debug, Error)]
pub enum LoaderBuildError {
    /// The HTTP client could not be configured (TLS backend, resolver, etc.)
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The loader was created outside a Tokio runtime
    #[error("No Tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Fetches podcast feeds and converts them into [`Podcast`](crate::Podcast) records.
///
/// Each call is independent: the loader holds only the shared HTTP connection
/// pool and the response cache, so any number of fetches may run concurrently.
/// Cloning is cheap.
#[derive(Clone)]
pub struct PodcastFeedLoader {
    client: reqwest::Client,
    converter: FeedConverter,
    cache: Option<Arc<ResponseCache>>,
    cache_policy: CachePolicy,
    max_feed_size: usize,
    callbacks: CallbackQueue,
    runtime: Handle,
}

impl std::fmt::Debug for PodcastFeedLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodcastFeedLoader")
            .field("cache_enabled", &self.cache.is_some())
            .field("cache_policy", &self.cache_policy)
            .field("max_feed_size", &self.max_feed_size)
            .finish_non_exhaustive()
    }
}

impl PodcastFeedLoader {
    /// Builds a loader with an HTTP client configured from `config`.
    ///
    /// Must be called from within a Tokio runtime; [`fetch`](Self::fetch)
    /// spawns its work onto that runtime.
    pub fn new(config: &LoaderConfig, callbacks: CallbackQueue) -> Result<Self, LoaderBuildError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Self::with_parts(config, client, FeedConverter::default(), callbacks)
    }

    /// Builds a loader around a caller-supplied client and converter.
    ///
    /// The client's own timeout applies; `config.timeout_secs` is not consulted.
    pub fn with_parts(
        config: &LoaderConfig,
        client: reqwest::Client,
        converter: FeedConverter,
        callbacks: CallbackQueue,
    ) -> Result<Self, LoaderBuildError> {
        let cache = NonZeroUsize::new(config.cache_capacity)
            .map(|capacity| Arc::new(Mutex::new(LruCache::new(capacity))));

        Ok(Self {
            client,
            converter,
            cache,
            cache_policy: config.cache_policy,
            max_feed_size: config.max_feed_size,
            callbacks,
            runtime: Handle::try_current()?,
        })
    }

    /// Loads `url` in the background and hands the result to `on_complete`.
    ///
    /// `on_complete` runs exactly once, always on the loader's
    /// [`CallbackQueue`] thread, whatever the outcome.
    pub fn fetch<F>(&self, url: Url, on_complete: F)
    where
        F: FnOnce(LoadResult) + Send + 'static,
    {
        let loader = self.clone();
        self.runtime.spawn(async move {
            let result = loader.load(&url).await;
            if loader.callbacks.dispatch(move || on_complete(result)).is_err() {
                tracing::warn!(url = %url, "Callback queue closed, dropping feed result");
            }
        });
    }

    /// Fetches, parses and converts a single feed.
    ///
    /// # Errors
    ///
    /// - [`LoadingError::Networking`] - DNS, connection, TLS or timeout failure
    /// - [`LoadingError::NotFound`] - HTTP 404
    /// - [`LoadingError::ServerError`] - HTTP 5xx
    /// - [`LoadingError::RequestFailed`] - any other non-200 status
    /// - [`LoadingError::EmptyResponseBody`] - HTTP 200 without a body
    /// - [`LoadingError::ResponseTooLarge`] - body exceeded `max_feed_size`
    /// - [`LoadingError::FeedParsing`] - body is not an RSS/Atom feed
    /// - [`LoadingError::UnsupportedFormat`] - feed is neither Atom nor RSS
    /// - [`LoadingError::MissingAttribute`] - a required podcast field is absent
    pub async fn load(&self, url: &Url) -> LoadResult {
        let body = match self.cached_body(url) {
            Some(body) => {
                tracing::debug!(url = %url, bytes = body.len(), "Serving feed from cache");
                body
            }
            None => self.download(url).await?,
        };

        let result = self.converter.load(body).await;
        if let Err(e) = &result {
            tracing::debug!(url = %url, error = %e, "Feed conversion failed");
        }
        result
    }

    fn cached_body(&self, url: &Url) -> Option<Arc<[u8]>> {
        if self.cache_policy != CachePolicy::ReturnCacheDataElseLoad {
            return None;
        }
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(url.as_str()).cloned()
    }

    fn store_body(&self, url: &Url, body: &Arc<[u8]>) {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.put(url.as_str().to_string(), Arc::clone(body));
        }
    }

    async fn download(&self, url: &Url) -> Result<Arc<[u8]>, LoadingError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Feed request failed before a response");
            LoadingError::Networking(e)
        })?;

        let status = response.status().as_u16();
        classify_status(status).inspect_err(|e| {
            tracing::warn!(url = %url, status = status, error = %e, "Feed request returned an error status");
        })?;

        let body = read_limited_bytes(response, self.max_feed_size).await?;
        if body.is_empty() {
            tracing::warn!(url = %url, "Feed response had an empty body");
            return Err(LoadingError::EmptyResponseBody);
        }

        let body: Arc<[u8]> = Arc::from(body);
        self.store_body(url, &body);
        Ok(body)
    }
}

/// Maps an HTTP status to the loader's outcome.
///
/// Only 200 proceeds to parsing; every other 2xx counts as a failed request.
pub fn classify_status(status: u16) -> Result<(), LoadingError> {
    match status {
        200 => Ok(()),
        404 => Err(LoadingError::NotFound),
        500..=599 => Err(LoadingError::ServerError(status)),
        _ => Err(LoadingError::RequestFailed(status)),
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, LoadingError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(LoadingError::ResponseTooLarge { limit });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(LoadingError::ResponseTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
