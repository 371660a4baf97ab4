//! End-to-end page fetch tests against a loopback server.

use axum::{http::header, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use webscout::{Error, PageFetcher, SearchConfig};

const ARTICLE_LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

fn article_page() -> String {
    let paragraph = "The politeness layer spaces requests out so upstream sources do not \
                     block the aggregator. It also rotates client identities between calls. \
                     Both behaviors matter more than raw throughput for scrape longevity.";
    format!(
        r#"<html><head><title>Polite Scraping Notes</title></head><body>
        <nav>home | about | archive</nav>
        <main>
          <script>trackPageView();</script>
          <div class="sidebar">related links</div>
          <p>{paragraph}</p>
          <p>{paragraph}</p>
        </main>
        <footer>copyright footer</footer>
        </body></html>"#
    )
}

fn bare_page() -> String {
    let prose = "Plain body prose without any recognizable content container element. ".repeat(6);
    format!("<html><body><p>{prose}</p></body></html>")
}

async fn spawn_server() -> SocketAddr {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let app = Router::new()
        .route(
            "/article",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                        (header::LAST_MODIFIED, ARTICLE_LAST_MODIFIED),
                    ],
                    article_page(),
                )
            }),
        )
        .route("/bare", get(|| async { axum::response::Html(bare_page()) }))
        .route("/empty", get(|| async { "" }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn fetches_and_extracts_article_content() {
    let addr = spawn_server().await;
    let fetcher = PageFetcher::with_client(reqwest::Client::new(), &SearchConfig::default());

    let url = format!("http://{addr}/article");
    let result = fetcher.fetch(&url).await.unwrap();

    assert_eq!(result.url, url);
    assert_eq!(result.title, "Polite Scraping Notes");
    assert!(result.content.contains("politeness layer"));
    assert!(!result.content.contains("home | about"));
    assert!(!result.content.contains("trackPageView"));
    assert!(!result.content.contains("related links"));
    assert!(!result.content.contains("copyright footer"));

    assert!(result.keywords.len() <= 8);
    assert!(
        result.summary.ends_with('.') || result.summary.ends_with('!') || result.summary.ends_with('?')
    );

    assert_eq!(result.metadata.domain, "127.0.0.1");
    assert!(result.metadata.content_type.starts_with("text/html"));
    assert!(result.metadata.length > 0);
    assert_eq!(
        result.metadata.last_modified.as_deref(),
        Some(ARTICLE_LAST_MODIFIED)
    );
}

#[tokio::test]
async fn page_without_content_container_falls_back_to_body() {
    let addr = spawn_server().await;
    let fetcher = PageFetcher::with_client(reqwest::Client::new(), &SearchConfig::default());

    let result = fetcher.fetch(&format!("http://{addr}/bare")).await.unwrap();
    assert_eq!(result.title, "Untitled Document");
    assert!(result.content.contains("Plain body prose"));
    assert!(result.metadata.last_modified.is_none());
}

#[tokio::test]
async fn content_respects_the_configured_cap() {
    let addr = spawn_server().await;
    let cfg = SearchConfig {
        fetch_result_max_length: 80,
        ..SearchConfig::default()
    };
    let fetcher = PageFetcher::with_client(reqwest::Client::new(), &cfg);

    let result = fetcher.fetch(&format!("http://{addr}/bare")).await.unwrap();
    assert_eq!(result.content.chars().count(), 80);
}

#[tokio::test]
async fn upstream_errors_surface_directly() {
    let addr = spawn_server().await;
    let fetcher = PageFetcher::with_client(reqwest::Client::new(), &SearchConfig::default());

    let err = fetcher
        .fetch(&format!("http://{addr}/missing"))
        .await
        .unwrap_err();
    match err {
        Error::Fetch(msg) => assert!(msg.contains("404"), "got: {msg}"),
        other => panic!("expected Error::Fetch, got {other:?}"),
    }

    let err = fetcher
        .fetch(&format!("http://{addr}/empty"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Fetch(_)));
}
