//! Envelopes the API wraps its lists in.  They are unwrapped immediately
//! after decoding.

use serde::Deserialize;

use super::{Article, Source};

/// Body of the headlines and search endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponseWrapper {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// Body of the sources endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceResponseWrapper {
    pub status: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_wrapper_keeps_order() {
        let json = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [{"title": "first"}, {"title": "second"}]
        }"#;

        let wrapper: ArticleResponseWrapper = serde_json::from_str(json).unwrap();

        assert_eq!(wrapper.status, "ok");
        assert_eq!(wrapper.total_results, Some(2));
        let titles: Vec<_> = wrapper
            .articles
            .iter()
            .map(|a| a.title.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(titles, ["first", "second"]);
    }

    #[test]
    fn missing_list_is_empty() {
        let wrapper: SourceResponseWrapper = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(wrapper.sources.is_empty());
    }

    #[test]
    fn one_bad_date_fails_the_envelope() {
        let json = r#"{
            "status": "ok",
            "articles": [
                {"publishedAt": "2024-01-01T00:00:00Z"},
                {"publishedAt": "yesterday"}
            ]
        }"#;
        assert!(serde_json::from_str::<ArticleResponseWrapper>(json).is_err());
    }
}
