//! `Cache-Control` directives the cache cares about.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, CACHE_CONTROL};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: Option<u64>,
    pub max_stale: Option<u64>,
    pub no_cache: bool,
    pub no_store: bool,
}

impl CacheControl {
    pub fn new(max_age: Duration, max_stale: Duration) -> Self {
        Self {
            max_age: Some(max_age.as_secs()),
            max_stale: Some(max_stale.as_secs()),
            ..Self::default()
        }
    }

    pub fn parse(header: &str) -> Self {
        let mut control = Self::default();

        for directive in header.split(',') {
            let directive = directive.trim();

            match directive {
                "no-cache" => control.no_cache = true,
                "no-store" => control.no_store = true,
                _ => {
                    if let Some(secs) = directive.strip_prefix("max-age=") {
                        control.max_age = secs.trim_matches('"').parse().ok();
                    } else if let Some(secs) = directive.strip_prefix("max-stale=") {
                        control.max_stale = secs.trim_matches('"').parse().ok();
                    }
                }
            }
        }

        control
    }

    /// Collect every `Cache-Control` header in `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Self::parse(&joined)
    }

    /// Whether a response carrying these directives may be written to disk.
    pub fn is_storable(&self) -> bool {
        !self.no_store
    }

    pub fn freshness(&self, age: Duration) -> Freshness {
        if self.no_cache {
            return Freshness::Stale;
        }
        let max_age = self.max_age.unwrap_or(0);
        let max_stale = self.max_stale.unwrap_or(0);
        let age = age.as_secs();

        if age < max_age {
            Freshness::Fresh
        } else if age < max_age.saturating_add(max_stale) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.no_cache {
            parts.push("no-cache".to_string());
        }
        if self.no_store {
            parts.push("no-store".to_string());
        }
        if let Some(secs) = self.max_age {
            parts.push(format!("max-age={secs}"));
        }
        if let Some(secs) = self.max_stale {
            parts.push(format!("max-stale={secs}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Where a cached entry sits relative to its directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Within `max-age`: serve without touching the network.
    Fresh,
    /// Past `max-age` but within `max-stale`: go to the network, fall back to
    /// this entry if the network fails.
    Stale,
    /// Past both: unusable.
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn formats_the_rewrite_policy() {
        let control = CacheControl::new(Duration::from_secs(3600), Duration::from_secs(259_200));
        assert_eq!(control.to_string(), "max-age=3600, max-stale=259200");
    }

    #[test]
    fn parses_what_it_formats() {
        let control = CacheControl::parse("max-age=3600, max-stale=259200");
        assert_eq!(control.max_age, Some(3600));
        assert_eq!(control.max_stale, Some(259_200));
        assert!(control.is_storable());
    }

    #[test]
    fn parses_server_directives() {
        let control = CacheControl::parse("no-cache, no-store, must-revalidate");
        assert!(control.no_cache);
        assert!(!control.is_storable());
        assert!(control.max_age.is_none());
    }

    #[test]
    fn joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        headers.append(CACHE_CONTROL, HeaderValue::from_static("max-stale=120"));

        let control = CacheControl::from_headers(&headers);
        assert_eq!(control.max_age, Some(60));
        assert_eq!(control.max_stale, Some(120));
    }

    #[test]
    fn freshness_windows() {
        let control = CacheControl::new(Duration::from_secs(3600), Duration::from_secs(259_200));

        assert_eq!(control.freshness(Duration::from_secs(10)), Freshness::Fresh);
        assert_eq!(control.freshness(Duration::from_secs(2 * 3600)), Freshness::Stale);
        assert_eq!(
            control.freshness(Duration::from_secs(4 * 24 * 3600)),
            Freshness::Expired
        );
    }

    #[test]
    fn no_directives_means_nothing_is_fresh() {
        let control = CacheControl::default();
        assert_eq!(control.freshness(Duration::ZERO), Freshness::Expired);
    }
}
