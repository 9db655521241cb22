//! Integration tests for the fetch → parse → convert pipeline.
//!
//! Each test serves a feed from its own wiremock server and drives the public
//! loader API end-to-end, checking both the podcast record and the exact
//! error kind for each failure class.

use pretty_assertions::assert_eq;
use podcast_feed_loader::feed::{convert, FeedParser, FeedRsParser};
use podcast_feed_loader::{
    CallbackQueue, LoadResult, LoaderConfig, LoadingError, Podcast, PodcastFeedLoader,
};
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

async fn serve_feed(body: &str, content_type: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", content_type),
        )
        .mount(&mock_server)
        .await;
    mock_server
}

async fn serve_status(status: u16) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string("<rss/>"))
        .mount(&mock_server)
        .await;
    mock_server
}

fn loader() -> PodcastFeedLoader {
    let (callbacks, _thread) = CallbackQueue::spawn("test-callbacks").unwrap();
    let config = LoaderConfig {
        cache_capacity: 0,
        ..LoaderConfig::default()
    };
    PodcastFeedLoader::new(&config, callbacks).unwrap()
}

async fn fetch(server: &MockServer) -> LoadResult {
    let url = Url::parse(&format!("{}/feed", server.uri())).unwrap();
    let (tx, rx) = oneshot::channel();
    loader().fetch(url, move |result| {
        let _ = tx.send(result);
    });
    rx.await.expect("completion callback never fired")
}

fn atom_feed(title: Option<&str>, logo: Option<&str>, extra: &str) -> String {
    let title = title.map(|t| format!("<title>{t}</title>")).unwrap_or_default();
    let logo = logo.map(|l| format!("<logo>{l}</logo>")).unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-01-01T00:00:00Z</updated>
    {title}
    {logo}
    {extra}
</feed>"#
    )
}

struct RssFields<'a> {
    title: Option<&'a str>,
    owner: Option<&'a str>,
    image: Option<&'a str>,
    extra: &'a str,
}

impl Default for RssFields<'_> {
    fn default() -> Self {
        Self {
            title: Some("Show"),
            owner: Some("Jane"),
            image: Some("https://x/art.jpg"),
            extra: "",
        }
    }
}

fn rss_feed(fields: RssFields<'_>) -> String {
    let title = fields
        .title
        .map(|t| format!("<title>{t}</title>"))
        .unwrap_or_default();
    let owner = fields
        .owner
        .map(|o| format!("<itunes:owner><itunes:name>{o}</itunes:name></itunes:owner>"))
        .unwrap_or_default();
    let image = fields
        .image
        .map(|i| format!(r#"<itunes:image href="{i}"/>"#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="{ITUNES_NS}">
<channel>
    {title}
    {owner}
    {image}
    {extra}
    <item><guid>ep-1</guid><title>Episode 1</title></item>
</channel>
</rss>"#,
        extra = fields.extra
    )
}

fn missing_field(result: LoadResult) -> &'static str {
    match result {
        Err(LoadingError::MissingAttribute(field)) => field,
        other => panic!("Expected MissingAttribute, got {:?}", other),
    }
}

// ============================================================================
// HTTP Status Classification
// ============================================================================

#[tokio::test]
async fn test_status_404_is_not_found() {
    let server = serve_status(404).await;
    assert!(matches!(fetch(&server).await, Err(LoadingError::NotFound)));
}

#[tokio::test]
async fn test_5xx_statuses_are_server_errors() {
    for status in [500, 502, 503, 599] {
        let server = serve_status(status).await;
        match fetch(&server).await {
            Err(LoadingError::ServerError(s)) => assert_eq!(s, status),
            other => panic!("Expected ServerError({status}), got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_other_statuses_are_request_failed() {
    for status in [201, 204, 400, 401, 403, 410, 429] {
        let server = serve_status(status).await;
        match fetch(&server).await {
            Err(LoadingError::RequestFailed(s)) => assert_eq!(s, status),
            other => panic!("Expected RequestFailed({status}), got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_empty_body_still_completes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        fetch(&mock_server).await,
        Err(LoadingError::EmptyResponseBody)
    ));
}

// ============================================================================
// Parse Failures
// ============================================================================

#[tokio::test]
async fn test_malformed_body_is_parsing_error() {
    let server = serve_feed("<html><body>not a feed</body>", "text/html").await;
    assert!(matches!(
        fetch(&server).await,
        Err(LoadingError::FeedParsing(_))
    ));
}

#[tokio::test]
async fn test_json_feed_is_unsupported() {
    let json = r#"{"version": "https://jsonfeed.org/version/1.1", "title": "Show", "items": []}"#;
    let server = serve_feed(json, "application/feed+json").await;

    assert!(matches!(
        fetch(&server).await,
        Err(LoadingError::UnsupportedFormat(_))
    ));
}

// ============================================================================
// Atom Conversion
// ============================================================================

#[tokio::test]
async fn test_minimal_atom_feed() {
    let body = atom_feed(Some("My Show"), Some("https://x/img.png"), "");
    let server = serve_feed(&body, "application/atom+xml").await;

    let podcast = fetch(&server).await.unwrap();
    assert_eq!(
        podcast,
        Podcast {
            title: "My Show".to_string(),
            author: String::new(),
            artwork_url: Url::parse("https://x/img.png").unwrap(),
            description: String::new(),
            primary_genre: None,
        }
    );
}

#[tokio::test]
async fn test_full_atom_feed() {
    let extra = r#"
    <subtitle>Weekly conversations</subtitle>
    <author><name>Alice</name></author>
    <author><name>Bob</name></author>
    <category term="tech" label="Technology"/>
    <category term="news" label="News"/>"#;
    let body = atom_feed(Some("My Show"), Some("https://x/img.png"), extra);
    let server = serve_feed(&body, "application/atom+xml").await;

    let podcast = fetch(&server).await.unwrap();
    assert_eq!(podcast.author, "Alice, Bob");
    assert_eq!(podcast.description, "Weekly conversations");
    assert_eq!(podcast.primary_genre.as_deref(), Some("Technology"));
}

#[tokio::test]
async fn test_atom_missing_title_reported_before_logo() {
    let body = atom_feed(None, None, "");
    let server = serve_feed(&body, "application/atom+xml").await;

    assert_eq!(missing_field(fetch(&server).await), "title");
}

#[tokio::test]
async fn test_atom_missing_logo() {
    let body = atom_feed(Some("My Show"), None, "");
    let server = serve_feed(&body, "application/atom+xml").await;

    assert_eq!(missing_field(fetch(&server).await), "logo");
}

// ============================================================================
// RSS Conversion
// ============================================================================

#[tokio::test]
async fn test_rss_plain_category_preferred_over_itunes() {
    let body = rss_feed(RssFields {
        extra: r#"<category>Comedy</category><itunes:category text="Arts"/>"#,
        ..RssFields::default()
    });
    let server = serve_feed(&body, "application/rss+xml").await;

    let podcast = fetch(&server).await.unwrap();
    assert_eq!(
        podcast,
        Podcast {
            title: "Show".to_string(),
            author: "Jane".to_string(),
            artwork_url: Url::parse("https://x/art.jpg").unwrap(),
            description: String::new(),
            primary_genre: Some("Comedy".to_string()),
        }
    );
}

#[tokio::test]
async fn test_rss_itunes_category_fallback_and_description() {
    let body = rss_feed(RssFields {
        extra: r#"<description>All about the show</description><itunes:category text="Arts"/>"#,
        ..RssFields::default()
    });
    let server = serve_feed(&body, "application/rss+xml").await;

    let podcast = fetch(&server).await.unwrap();
    assert_eq!(podcast.description, "All about the show");
    assert_eq!(podcast.primary_genre.as_deref(), Some("Arts"));
}

#[tokio::test]
async fn test_rss_missing_owner_even_with_image() {
    let body = rss_feed(RssFields {
        owner: None,
        ..RssFields::default()
    });
    let server = serve_feed(&body, "application/rss+xml").await;

    assert_eq!(missing_field(fetch(&server).await), "itunes:owner name");
}

#[tokio::test]
async fn test_rss_invalid_image_url() {
    let body = rss_feed(RssFields {
        image: Some("not a url"),
        ..RssFields::default()
    });
    let server = serve_feed(&body, "application/rss+xml").await;

    assert_eq!(missing_field(fetch(&server).await), "itunes:image url");
}

// ============================================================================
// Required Fields (parse + convert without HTTP)
// ============================================================================

fn parse_and_convert(body: &str) -> LoadResult {
    let document = FeedRsParser.parse(body.as_bytes()).unwrap();
    convert(document)
}

#[test]
fn test_complete_documents_never_error() {
    assert!(parse_and_convert(&atom_feed(Some("A"), Some("https://x/a.png"), "")).is_ok());
    assert!(parse_and_convert(&rss_feed(RssFields::default())).is_ok());
}

#[test]
fn test_each_missing_rss_field_reported() {
    let cases = [
        (
            RssFields {
                title: None,
                ..RssFields::default()
            },
            "title",
        ),
        (
            RssFields {
                owner: None,
                ..RssFields::default()
            },
            "itunes:owner name",
        ),
        (
            RssFields {
                image: None,
                ..RssFields::default()
            },
            "itunes:image url",
        ),
    ];

    for (fields, expected) in cases {
        assert_eq!(missing_field(parse_and_convert(&rss_feed(fields))), expected);
    }
}

#[test]
fn test_each_missing_atom_field_reported() {
    assert_eq!(
        missing_field(parse_and_convert(&atom_feed(None, Some("https://x/a.png"), ""))),
        "title"
    );
    assert_eq!(
        missing_field(parse_and_convert(&atom_feed(Some("A"), None, ""))),
        "logo"
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetches_are_independent() {
    let atom_server = serve_feed(
        &atom_feed(Some("Atom Show"), Some("https://x/img.png"), ""),
        "application/atom+xml",
    )
    .await;
    let rss_server = serve_feed(&rss_feed(RssFields::default()), "application/rss+xml").await;
    let missing_server = serve_status(404).await;

    let (atom, rss, missing) = tokio::join!(
        fetch(&atom_server),
        fetch(&rss_server),
        fetch(&missing_server)
    );

    assert_eq!(atom.unwrap().title, "Atom Show");
    assert_eq!(rss.unwrap().title, "Show");
    assert!(matches!(missing, Err(LoadingError::NotFound)));
}
