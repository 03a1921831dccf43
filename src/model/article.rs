//! The article type returned by the headlines and search endpoints.
//!
//! Articles are built by deserializing the API payload.  The only change the
//! client ever makes to one is the category tag the headlines operation
//! applies, and that produces a new value through [`Article::with_category`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Publisher reference embedded in every article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A single news article.
///
/// Every text field is optional because the provider omits or nulls them
/// freely.  `published_at` is strict: a present but malformed timestamp
/// fails the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,

    #[serde(default)]
    pub author: Option<String>,

    /// Human-readable headline.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Link to the full story.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub url_to_image: Option<String>,

    /// Publication timestamp in UTC.
    #[serde(default, with = "timestamp")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub content: Option<String>,

    /// Query category this article was fetched under.
    ///
    /// The API never sends it; the headlines operation fills it in from the
    /// request.
    #[serde(default)]
    pub category: Option<String>,
}

impl Article {
    /// Return this article tagged with `category`.
    pub fn with_category(self, category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..self
        }
    }
}

/// Timestamp layout the provider uses, e.g. `2024-03-01T09:30:00Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse one provider timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Serde adapter for `Option<DateTime<Utc>>` in [`TIMESTAMP_FORMAT`].
///
/// `null` and a missing field both map to `None`.
mod timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&dt.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_provider_payload() {
        let json = r#"{
            "source": {"id": "bbc-news", "name": "BBC News"},
            "author": "BBC",
            "title": "Something happened",
            "description": "Details",
            "url": "https://example.com/a",
            "urlToImage": "https://example.com/a.jpg",
            "publishedAt": "2024-03-01T09:30:00Z",
            "content": "Body"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();

        assert_eq!(article.source.id.as_deref(), Some("bbc-news"));
        assert_eq!(article.title.as_deref(), Some("Something happened"));
        assert_eq!(article.url_to_image.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(
            article.published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
        );
        assert!(article.category.is_none(), "API never tags a category");
    }

    #[test]
    fn null_and_missing_dates_are_none() {
        let a: Article = serde_json::from_str(r#"{"publishedAt": null}"#).unwrap();
        let b: Article = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert!(a.published_at.is_none());
        assert!(b.published_at.is_none());
    }

    #[test]
    fn malformed_date_fails_deserialization() {
        let result = serde_json::from_str::<Article>(r#"{"publishedAt": "01/03/2024 09:30"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn with_category_leaves_other_fields_alone() {
        let article = Article {
            title: Some("t".into()),
            category: Some("business".into()),
            ..Article::default()
        };

        let tagged = article.clone().with_category("tech");

        assert_eq!(tagged.category.as_deref(), Some("tech"));
        assert_eq!(tagged.title, article.title);
    }

    #[test]
    fn timestamp_survives_serialization() {
        let article = Article {
            published_at: Some(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()),
            ..Article::default()
        };
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains(r#""publishedAt":"2025-06-15T12:00:00Z""#));
    }
}
