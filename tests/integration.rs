//! End-to-end tests through the reqwest middleware chain against a mockito server.

use dove_news::{ClientConfig, ClientFactory, Error, Specification};
use mockito::Matcher;

const HEADLINES: &str = r#"{
    "status": "ok",
    "totalResults": 2,
    "articles": [
        {
            "source": {"id": null, "name": "Example"},
            "title": "Chips get faster",
            "url": "https://example.com/chips",
            "publishedAt": "2024-05-01T08:00:00Z"
        },
        {
            "source": {"id": "wire", "name": "Wire"},
            "title": "Compilers get smarter",
            "publishedAt": "2024-05-01T09:15:00Z"
        }
    ]
}"#;

fn factory_for(base_url: String) -> ClientFactory {
    ClientFactory::new(ClientConfig {
        base_url,
        ..ClientConfig::default()
    })
}

fn spec() -> Specification {
    Specification::new("technology", "us", "test-key")
}

#[tokio::test]
async fn headlines_round_trip_through_the_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/top-headlines")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "technology".into()),
            Matcher::UrlEncoded("country".into(), "us".into()),
            Matcher::UrlEncoded("apiKey".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("pragma", "no-cache")
        .with_header("cache-control", "no-store")
        .with_body(HEADLINES)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client = factory_for(format!("{}/", server.url()))
        .get_instance(dir.path())
        .expect("client should build");

    let first = client
        .get_headlines(&spec())
        .wait()
        .await
        .expect("first call publishes");
    let second = client
        .get_headlines(&spec())
        .wait()
        .await
        .expect("second call publishes");

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(first
        .iter()
        .all(|a| a.category.as_deref() == Some("technology")));
    assert_eq!(first[1].source.id.as_deref(), Some("wire"));

    // The server asked for no-store; the rewrite rule overrode it.
    mock.assert_async().await;
}

#[tokio::test]
async fn sources_omit_language_and_country() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/sources")
        .match_query(Matcher::Exact("category=technology&apiKey=test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"ok","sources":[{"id":"a"},{"id":"b"}]}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client = factory_for(format!("{}/", server.url()))
        .get_instance(dir.path())
        .expect("client should build");

    let sources = client
        .fetch_sources(&spec())
        .await
        .expect("sources should load");

    let ids: Vec<_> = sources.iter().filter_map(|s| s.id.as_deref()).collect();
    assert_eq!(ids, ["a", "b"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn search_error_status_is_silent_on_the_observable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/everything")
        .match_query(Matcher::UrlEncoded("q".into(), "rust".into()))
        .with_status(401)
        .with_body(r#"{"status":"error","code":"apiKeyMissing"}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client = factory_for(format!("{}/", server.url()))
        .get_instance(dir.path())
        .expect("client should build");

    let mut observable = client.get_search_for_news("rust");
    assert!(observable.wait().await.is_none());
    assert!(observable.get().is_none());

    assert!(matches!(
        client.fetch_search_for_news("rust").await,
        Err(Error::Status { status: 401 })
    ));
}

#[tokio::test]
async fn unreachable_server_publishes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Port 9 (discard) is closed on test machines; the connection is refused.
    let client = factory_for("http://127.0.0.1:9/".into())
        .get_instance(dir.path())
        .expect("client should build");

    assert!(client.get_headlines(&spec()).wait().await.is_none());
    assert!(matches!(
        client.fetch_headlines(&spec()).await,
        Err(Error::Transport(_))
    ));
}

#[test]
fn global_factory_uses_production_defaults() {
    let factory = ClientFactory::global();
    assert_eq!(factory.config().base_url, "https://newsapi.org/");
    assert!(std::ptr::eq(factory, ClientFactory::global()));
}
