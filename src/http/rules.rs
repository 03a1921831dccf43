//! Middleware applied around each exchange.
//!
//! [`CacheControlRewrite`] sits below the cache and rewrites responses that
//! came off the network before they are stored; cache hits never pass through
//! it.  The [`HttpLogger`] sits above the cache and sees every exchange.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use serde::{Deserialize, Serialize};
use url::Url;

use super::cache_control::CacheControl;
use super::HttpResponse;

/// Replaces whatever caching headers the server sent with a fixed policy.
///
/// `Pragma` is removed and `Cache-Control` is overwritten, so the cache keeps
/// every response fresh for `max_age` and usable offline for a further
/// `max_stale`.
#[derive(Debug, Clone)]
pub struct CacheControlRewrite {
    directive: CacheControl,
}

impl CacheControlRewrite {
    pub fn new(max_age: Duration, max_stale: Duration) -> Self {
        Self {
            directive: CacheControl::new(max_age, max_stale),
        }
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.remove(PRAGMA);
        match HeaderValue::from_str(&self.directive.to_string()) {
            Ok(value) => {
                headers.insert(CACHE_CONTROL, value);
            }
            Err(e) => tracing::warn!("invalid cache-control directive: {e}"),
        }
    }
}

#[async_trait]
impl Middleware for CacheControlRewrite {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut ::http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let mut response = next.run(req, extensions).await?;
        self.apply(response.headers_mut());
        Ok(response)
    }
}

/// How much of each exchange [`HttpLogger`] records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    /// Request line, status, and timing.
    Basic,
    /// Basic plus headers.
    Headers,
    /// Headers plus the full body.
    #[default]
    Body,
}

/// Diagnostic logging of requests and responses through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpLogger {
    level: LogLevel,
}

impl HttpLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn request(&self, method: &reqwest::Method, url: &Url) {
        if self.level == LogLevel::None {
            return;
        }
        tracing::debug!(target: "dove_news::http", "--> {} {}", method, redact(url));
    }

    pub fn response(&self, response: &HttpResponse, elapsed: Duration) {
        if self.level == LogLevel::None {
            return;
        }

        tracing::debug!(
            target: "dove_news::http",
            "<-- {} {} ({} ms, {}, {} bytes)",
            response.status,
            redact(&response.url),
            elapsed.as_millis(),
            response.source,
            response.body.len(),
        );

        if matches!(self.level, LogLevel::Headers | LogLevel::Body) {
            for (name, value) in &response.headers {
                tracing::debug!(
                    target: "dove_news::http",
                    "{}: {}",
                    name,
                    value.to_str().unwrap_or("<binary>")
                );
            }
        }

        if self.level == LogLevel::Body {
            tracing::debug!(
                target: "dove_news::http",
                "{}",
                String::from_utf8_lossy(&response.body)
            );
        }
    }
}

#[async_trait]
impl Middleware for HttpLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut ::http::Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if self.level == LogLevel::None {
            return next.run(req, extensions).await;
        }

        let started = Instant::now();
        let url = req.url().clone();
        self.request(req.method(), &url);

        let response = match next.run(req, extensions).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    target: "dove_news::http",
                    "<-- HTTP FAILED {} ({} ms): {e}",
                    redact(&url),
                    started.elapsed().as_millis()
                );
                return Err(e);
            }
        };

        let response = HttpResponse::read(url, response).await?;
        self.response(&response, started.elapsed());
        response
            .into_reqwest()
            .map_err(reqwest_middleware::Error::middleware)
    }
}

/// Drop the API key from a URL before it is logged.
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "apiKey") {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "apiKey" { "REDACTED".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
