//! Client configuration.
//!
//! [`ClientConfig::default`] carries the production values: the newsapi.org
//! root, a 5 MiB response cache, and a cache policy that keeps responses fresh
//! for one hour and usable while offline for three days.  The viewer binary
//! can override any of these from a TOML file.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::http::LogLevel;

/// Root of the news API.  Endpoint paths are joined onto it.
pub const NEWS_API_URL: &str = "https://newsapi.org/";

/// 5 MiB.
pub const DEFAULT_CACHE_SIZE: u64 = 5 * 1024 * 1024;

/// One hour.
pub const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60;

/// Three days.
pub const DEFAULT_MAX_STALE_SECS: u64 = 3 * 24 * 60 * 60;

/// Settings used by [`ClientFactory`](crate::ClientFactory) when it builds
/// the shared client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: String,
    /// Upper bound on the bytes the disk cache may hold.
    pub cache_max_size: u64,
    /// `max-age` written onto every network response.
    pub max_age_secs: u64,
    /// `max-stale` written onto every network response.
    pub max_stale_secs: u64,
    /// How much of each exchange the HTTP logger records.
    pub log_level: LogLevel,
    /// Optional whole-request timeout.  `None` keeps reqwest's default.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: NEWS_API_URL.to_string(),
            cache_max_size: DEFAULT_CACHE_SIZE,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            max_stale_secs: DEFAULT_MAX_STALE_SECS,
            log_level: LogLevel::Body,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Parse [`base_url`](Self::base_url).
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn max_stale(&self) -> Duration {
        Duration::from_secs(self.max_stale_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_policy() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://newsapi.org/");
        assert_eq!(config.cache_max_size, 5_242_880);
        assert_eq!(config.max_age(), Duration::from_secs(3600));
        assert_eq!(config.max_stale(), Duration::from_secs(259_200));
        assert_eq!(config.log_level, LogLevel::Body);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            base_url = "http://localhost:8080/"
            log_level = "basic"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/");
        assert_eq!(config.log_level, LogLevel::Basic);
        assert_eq!(config.cache_max_size, DEFAULT_CACHE_SIZE);
        assert_eq!(config.max_stale_secs, DEFAULT_MAX_STALE_SECS);
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let config = ClientConfig {
            base_url: "not a url".into(),
            ..ClientConfig::default()
        };
        assert!(config.base_url().is_err());
    }
}
