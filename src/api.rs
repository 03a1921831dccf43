//! Typed description of the three news API endpoints.
//!
//! [`NewsApi`] knows paths and query parameters and decodes bodies; it does no
//! post-processing.  A body is `None` when the server answered with a
//! non-success status or with a literal `null`, mirroring what the endpoint
//! actually returned.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;
use crate::http::{HttpClient, ResponseSource};
use crate::model::{ArticleResponseWrapper, SourceResponseWrapper};

const TOP_HEADLINES: &str = "v2/top-headlines";
const EVERYTHING: &str = "v2/everything";
const SOURCES: &str = "v2/sources";

/// Decoded endpoint response.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub source: ResponseSource,
    pub body: Option<T>,
}

#[derive(Debug, Clone)]
pub struct NewsApi {
    http: Arc<HttpClient>,
    base_url: Url,
}

impl NewsApi {
    pub fn new(http: Arc<HttpClient>, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `GET v2/top-headlines?category=&country=&apiKey=`
    pub async fn get_headlines(
        &self,
        category: &str,
        country: &str,
        api_key: &str,
    ) -> Result<ApiResponse<ArticleResponseWrapper>> {
        self.call(
            TOP_HEADLINES,
            &[
                ("category", Some(category)),
                ("country", Some(country)),
                ("apiKey", Some(api_key)),
            ],
        )
        .await
    }

    /// `GET v2/everything?q=`
    pub async fn get_search_for_news(
        &self,
        query: &str,
    ) -> Result<ApiResponse<ArticleResponseWrapper>> {
        self.call(EVERYTHING, &[("q", Some(query))]).await
    }

    /// `GET v2/sources?category=&language=&apiKey=&country=`
    ///
    /// Unset parameters are left out of the query entirely.
    pub async fn get_sources(
        &self,
        category: &str,
        language: Option<&str>,
        api_key: &str,
        country: Option<&str>,
    ) -> Result<ApiResponse<SourceResponseWrapper>> {
        self.call(
            SOURCES,
            &[
                ("category", Some(category)),
                ("language", language),
                ("apiKey", Some(api_key)),
                ("country", country),
            ],
        )
        .await
    }

    pub fn endpoint(&self, path: &str, query: &[(&str, Option<&str>)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        let present: Vec<_> = query
            .iter()
            .filter_map(|(k, v)| v.map(|v| (*k, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<&str>)],
    ) -> Result<ApiResponse<T>> {
        let url = self.endpoint(path, query)?;
        let response = self.http.get(&url).await?;

        let body = if response.is_success() {
            serde_json::from_slice::<Option<T>>(&response.body)?
        } else {
            tracing::debug!("{} answered {}", url.path(), response.status);
            None
        };

        Ok(ApiResponse {
            status: response.status,
            source: response.source,
            body,
        })
    }
}
