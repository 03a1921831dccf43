//! The caching HTTP client underneath the news API.
//!
//! Requests go through a [`reqwest_middleware`] chain:
//!
//! ```text
//!  get(url) ──► HttpLogger ──► DiskCache ──fresh──────────────────────────► response
//!                                  │
//!                                  └─stale/miss─► CacheControlRewrite ──► reqwest ──► DiskCache::put
//!                                                                           │
//!                                                     stale entry, if still usable ◄─error─┘
//! ```
//!
//! * [`cache`]: the on-disk store, its LRU bookkeeping, and its middleware.
//! * [`cache_control`]: parsing and formatting `Cache-Control`.
//! * [`rules`]: the response rewrite and the request/response logger.

pub mod cache;
pub mod cache_control;
pub mod rules;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware};
use url::Url;

pub use cache::{CacheEntry, CacheStats, DiskCache};
pub use cache_control::{CacheControl, Freshness};
pub use rules::{CacheControlRewrite, HttpLogger, LogLevel};

use crate::error::{Error, Result};

/// Where a response came from.
///
/// Carried between middleware in the response extensions; a response without
/// one came off the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Network => f.write_str("server"),
            ResponseSource::Cache => f.write_str("cache"),
        }
    }
}

/// A complete, buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Buffer `response`, which answered a request for `url`.
    pub async fn read(url: Url, response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let source = response
            .extensions()
            .get::<ResponseSource>()
            .copied()
            .unwrap_or(ResponseSource::Network);
        let body = response.bytes().await?;

        Ok(Self {
            url,
            status,
            headers,
            body,
            source,
        })
    }

    /// Turn the buffered response back into one that can travel up the
    /// middleware chain.
    pub fn into_reqwest(self) -> Result<reqwest::Response> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::Cache(format!("unusable status {}: {e}", self.status)))?;
        let mut response = ::http::Response::new(self.body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response.extensions_mut().insert(self.source);
        Ok(reqwest::Response::from(response))
    }
}

/// GET-only HTTP client with a disk cache in front of the network.
pub struct HttpClient {
    inner: ClientWithMiddleware,
    cache: Option<Arc<DiskCache>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn builder(client: reqwest::Client) -> HttpClientBuilder {
        HttpClientBuilder {
            client,
            cache: None,
            network_rules: Vec::new(),
            logger: HttpLogger::default(),
            backend: None,
        }
    }

    pub fn cache(&self) -> Option<&DiskCache> {
        self.cache.as_deref()
    }

    /// Fetch `url`, from the cache when the stored entry is still fresh.
    ///
    /// A stale entry is used only when the network fails and the entry is
    /// still inside its `max-stale` window.
    pub async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self.inner.get(url.clone()).send().await?;
        Ok(HttpResponse::read(url.clone(), response).await?)
    }
}

/// Assembles the middleware chain: logger, then cache, then network rules.
pub struct HttpClientBuilder {
    client: reqwest::Client,
    cache: Option<Arc<DiskCache>>,
    network_rules: Vec<Arc<dyn Middleware>>,
    logger: HttpLogger,
    backend: Option<Arc<dyn Middleware>>,
}

impl HttpClientBuilder {
    pub fn cache(mut self, cache: DiskCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Add a middleware run on every network response, in insertion order.
    /// Cache hits never reach it.
    pub fn network_rule(mut self, rule: impl Middleware) -> Self {
        self.network_rules.push(Arc::new(rule));
        self
    }

    pub fn logger(mut self, logger: HttpLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Answer network requests with `backend` instead of the reqwest client.
    pub fn backend(mut self, backend: Arc<dyn Middleware>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> HttpClient {
        let mut chain = ClientBuilder::new(self.client).with(self.logger);
        if let Some(cache) = &self.cache {
            chain = chain.with_arc(Arc::clone(cache) as Arc<dyn Middleware>);
        }
        for rule in self.network_rules {
            chain = chain.with_arc(rule);
        }
        if let Some(backend) = self.backend {
            chain = chain.with_arc(backend);
        }
        HttpClient {
            inner: chain.build(),
            cache: self.cache,
        }
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
