//! The shared news client and the factory that builds it.
//!
//! [`ClientFactory::get_instance`] builds the HTTP stack on first use and
//! hands every caller the same [`NewsApiClient`] afterwards.  The client
//! exposes each endpoint twice:
//!
//! * `get_*` return an [`Observable`] immediately and fill it from a worker
//!   task.  Failures leave it empty and are only logged.
//! * `fetch_*` are plain async functions returning [`Result`], for callers
//!   that want to see what went wrong.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use reqwest_middleware::Middleware;
use tokio::runtime::Runtime;

use crate::api::NewsApi;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{CacheControlRewrite, DiskCache, HttpClient, HttpLogger};
use crate::model::{Article, Source, Specification};
use crate::observable::{self, Observable};

/// Supplies the directory the response cache lives in.
pub trait PlatformContext {
    fn cache_dir(&self) -> PathBuf;
}

impl PlatformContext for Path {
    fn cache_dir(&self) -> PathBuf {
        self.to_path_buf()
    }
}

impl PlatformContext for PathBuf {
    fn cache_dir(&self) -> PathBuf {
        self.clone()
    }
}

static GLOBAL: Lazy<ClientFactory> = Lazy::new(|| ClientFactory::new(ClientConfig::default()));

/// Builds the shared [`NewsApiClient`] at most once.
///
/// Concurrent first callers block until one of them has finished building;
/// if building fails nothing is stored and the next call tries again.
pub struct ClientFactory {
    config: ClientConfig,
    backend: Option<Arc<dyn Middleware>>,
    instance: OnceCell<Arc<NewsApiClient>>,
}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .field("custom_backend", &self.backend.is_some())
            .field("instance", &self.instance)
            .finish()
    }
}

impl ClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            backend: None,
            instance: OnceCell::new(),
        }
    }

    /// Answer requests with `backend` instead of the network.  It sits below
    /// the cache and the header rewrite, where reqwest would otherwise be.
    pub fn with_backend(mut self, backend: Arc<dyn Middleware>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The process-wide factory, configured with [`ClientConfig::default`].
    ///
    /// Prefer owning a factory in the application's own context; this exists
    /// for code that has nowhere to keep one.
    pub fn global() -> &'static ClientFactory {
        &GLOBAL
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_instance<C>(&self, ctx: &C) -> Result<Arc<NewsApiClient>>
    where
        C: PlatformContext + ?Sized,
    {
        self.instance
            .get_or_try_init(|| self.build(ctx).map(Arc::new))
            .map(Arc::clone)
    }

    fn build<C>(&self, ctx: &C) -> Result<NewsApiClient>
    where
        C: PlatformContext + ?Sized,
    {
        let dir = ctx.cache_dir();
        tracing::info!("building news client, cache at {}", dir.display());

        let cache = DiskCache::open(&dir, self.config.cache_max_size)?;
        let mut network = reqwest::Client::builder();
        if let Some(timeout) = self.config.timeout() {
            network = network.timeout(timeout);
        }

        let mut http = HttpClient::builder(network.build()?)
            .logger(HttpLogger::new(self.config.log_level))
            .cache(cache)
            .network_rule(CacheControlRewrite::new(
                self.config.max_age(),
                self.config.max_stale(),
            ));
        if let Some(backend) = &self.backend {
            http = http.backend(Arc::clone(backend));
        }

        let api = NewsApi::new(Arc::new(http.build()), self.config.base_url()?);
        NewsApiClient::new(api)
    }
}

/// The client's own worker runtime.
///
/// Worker tasks never run on the caller's runtime, so the client keeps
/// working after whatever runtime it was built in has shut down.  Dropping
/// stops the workers without blocking, which is also allowed from async code.
#[derive(Debug)]
struct Dispatcher {
    runtime: Option<Runtime>,
}

impl Dispatcher {
    fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("dove-news-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(runtime) = &self.runtime {
            runtime.spawn(task);
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// The shared handle every request goes through.
#[derive(Debug)]
pub struct NewsApiClient {
    api: NewsApi,
    dispatcher: Dispatcher,
}

impl NewsApiClient {
    pub fn new(api: NewsApi) -> Result<Self> {
        Ok(Self {
            api,
            dispatcher: Dispatcher::new()?,
        })
    }

    pub fn api(&self) -> &NewsApi {
        &self.api
    }

    /// Top headlines for `spec`, each tagged with `spec.category`.
    pub fn get_headlines(&self, spec: &Specification) -> Observable<Vec<Article>> {
        let api = self.api.clone();
        let spec = spec.clone();
        self.publish("headlines", async move { headlines(&api, &spec).await })
    }

    /// Free-text search.  Articles come back exactly as the API sent them.
    pub fn get_search_for_news(&self, query: &str) -> Observable<Vec<Article>> {
        let api = self.api.clone();
        let query = query.to_string();
        self.publish("search", async move { search(&api, &query).await })
    }

    /// Sources in `spec.category`, unfiltered by language or country.
    pub fn get_sources(&self, spec: &Specification) -> Observable<Vec<Source>> {
        let api = self.api.clone();
        let spec = spec.clone();
        self.publish("sources", async move { sources(&api, &spec).await })
    }

    pub async fn fetch_headlines(&self, spec: &Specification) -> Result<Vec<Article>> {
        headlines(&self.api, spec).await
    }

    pub async fn fetch_search_for_news(&self, query: &str) -> Result<Vec<Article>> {
        search(&self.api, query).await
    }

    pub async fn fetch_sources(&self, spec: &Specification) -> Result<Vec<Source>> {
        sources(&self.api, spec).await
    }

    /// Run `fetch` on a worker and publish its value; an error is logged and
    /// leaves the observable unset.
    fn publish<T, F>(&self, operation: &'static str, fetch: F) -> Observable<T>
    where
        T: Send + Sync + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (publisher, observable) = observable::channel();
        self.dispatcher.spawn(async move {
            match fetch.await {
                Ok(value) => publisher.publish(value),
                Err(e) => tracing::debug!("{operation} request produced nothing: {e}"),
            }
        });
        observable
    }
}

async fn headlines(api: &NewsApi, spec: &Specification) -> Result<Vec<Article>> {
    let response = api
        .get_headlines(&spec.category, &spec.country, &spec.api_key)
        .await?;
    let body = body_or_error(response.status, response.body)?;
    Ok(body
        .articles
        .into_iter()
        .map(|article| article.with_category(spec.category.as_str()))
        .collect())
}

async fn search(api: &NewsApi, query: &str) -> Result<Vec<Article>> {
    let response = api.get_search_for_news(query).await?;
    Ok(body_or_error(response.status, response.body)?.articles)
}

async fn sources(api: &NewsApi, spec: &Specification) -> Result<Vec<Source>> {
    let response = api
        .get_sources(&spec.category, None, &spec.api_key, None)
        .await?;
    Ok(body_or_error(response.status, response.body)?.sources)
}

fn body_or_error<T>(status: u16, body: Option<T>) -> Result<T> {
    match body {
        Some(body) => Ok(body),
        None if (200..300).contains(&status) => Err(Error::EmptyBody),
        None => Err(Error::Status { status }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
