//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock listing servers and exercise the
//! full crawl cycle end-to-end: pagination following, retry behavior,
//! robots.txt handling, sink outages, and cancellation.

use async_trait::async_trait;
use newsreel::config::{Config, RulesConfig, SeedEntry};
use newsreel::crawler::{CrawlEngine, FinishReason};
use newsreel::item::{Item, ItemKey};
use newsreel::sink::{read_all, ItemSink, MemorySink, SinkError, SinkResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded at `/news?p=1` on the mock server
fn create_test_config(server_url: &str, patterns: Vec<String>) -> Config {
    let mut config = Config {
        seeds: vec![SeedEntry {
            url: format!("{}/news?p=1", server_url),
        }],
        rules: RulesConfig {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            follow_patterns: patterns,
        },
        ..Config::default()
    };
    config.crawler.workers = 1;
    config.crawler.host_delay_ms = 0;
    config.crawler.respect_robots = false;
    config.fetch.max_retries = 2;
    config.fetch.retry_backoff_ms = 10;
    config.sink.put_retries = 2;
    config.sink.put_backoff_ms = 5;
    config
}

/// Anchored allow-pattern for `/news?p=<pages>` on the mock server
fn page_pattern(server_url: &str, pages: &str) -> String {
    format!("^{}/news\\?p={}$", regex::escape(server_url), pages)
}

/// Builds one listing row in the shape the default selectors expect
fn listing_row(title: &str, href: &str) -> String {
    format!(
        r#"<tr class="athing"><td class="title"><span class="titleline"><a href="{}">{}</a></span></td></tr>"#,
        href, title
    )
}

/// Builds a listing page body with optional "More" pagination link
fn listing_page(rows: &[String], next_page: Option<&str>) -> String {
    let more = next_page
        .map(|href| format!(r#"<a href="{}" class="morelink">More</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><body><table class="itemlist">{}</table>{}</body></html>"#,
        rows.concat(),
        more
    )
}

/// Mounts a 200 listing page at `/news?p=<page>`
async fn mount_listing(server: &MockServer, page: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_paginated_listing_crawl_stores_items_in_order() {
    let server = MockServer::start().await;
    let url = server.uri();

    mount_listing(
        &server,
        "1",
        listing_page(
            &[
                listing_row("First story", "https://example.com/a"),
                listing_row("Second story", "https://example.com/b"),
            ],
            Some("news?p=2"),
        ),
        1,
    )
    .await;

    mount_listing(
        &server,
        "2",
        listing_page(
            &[
                listing_row("Third story", "https://example.com/c"),
                listing_row("Fourth story", "https://example.com/d"),
            ],
            Some("news?p=3"),
        ),
        1,
    )
    .await;

    // Page 3 carries one malformed row (anchor without href) that must be
    // skipped without affecting its neighbor, and a link to page 4 that the
    // allow-pattern keeps out of scope.
    let malformed_row = r#"<tr class="athing"><td class="title"><span class="titleline"><a>No href here</a></span></td></tr>"#.to_string();
    mount_listing(
        &server,
        "3",
        listing_page(
            &[
                listing_row("Fifth story", "https://example.com/e"),
                malformed_row,
            ],
            Some("news?p=4"),
        ),
        1,
    )
    .await;

    // Out of pattern scope, must never be fetched
    mount_listing(&server, "4", listing_page(&[], None), 0).await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[1-3]")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink.clone()).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.items_stored, 5);
    assert_eq!(report.items_abandoned, 0);
    // Seed plus the two in-scope pagination links
    assert_eq!(report.links_enqueued, 3);

    // Keys are dense from item-0, in page order then listing order
    let entries = read_all(sink.as_ref()).await.expect("Read-back failed");
    let titles: Vec<&str> = entries.iter().map(|(_, item)| item.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "First story",
            "Second story",
            "Third story",
            "Fourth story",
            "Fifth story"
        ]
    );
    for (position, (key, _)) in entries.iter().enumerate() {
        assert_eq!(key.index(), position as u64);
    }
}

#[tokio::test]
async fn test_pages_are_fetched_at_most_once() {
    let server = MockServer::start().await;
    let url = server.uri();

    // Page 1 links to page 2 twice; page 2 links back to page 1
    mount_listing(
        &server,
        "1",
        r#"<html><body>
        <a href="news?p=2">More</a>
        <a href="news?p=2">More (duplicate)</a>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;

    mount_listing(
        &server,
        "2",
        r#"<html><body><a href="news?p=1">Back</a></body></html>"#.to_string(),
        1,
    )
    .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_fetched, 2);
    // Seed plus one acceptance of page 2; duplicates and the back-link lose
    assert_eq!(report.links_enqueued, 2);
}

#[tokio::test]
async fn test_transient_failures_are_retried_until_success() {
    let server = MockServer::start().await;
    let url = server.uri();

    // Two 503 responses, then the real page. Mounted first, so it consumes
    // the first two requests before the success mock takes over.
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    mount_listing(
        &server,
        "1",
        listing_page(&[listing_row("Survivor", "https://example.com/s")], None),
        1,
    )
    .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink.clone()).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.items_stored, 1);
    assert_eq!(sink.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_terminal_rejection_is_not_retried() {
    let server = MockServer::start().await;
    let url = server.uri();

    // A 404 must burn exactly one request even with retries configured
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.pages_failed, 1);
}

#[tokio::test]
async fn test_exhausted_retries_fail_page_but_not_run() {
    let server = MockServer::start().await;
    let url = server.uri();

    // Page 1 always errors; with max_retries = 2 that is three requests.
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.items_stored, 0);
}

/// Sink wrapper that rejects items whose title carries a marker, counting
/// the attempts it turned away
struct FlakySink {
    inner: MemorySink,
    rejected_puts: AtomicU32,
}

impl FlakySink {
    fn new() -> Self {
        Self {
            inner: MemorySink::default(),
            rejected_puts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ItemSink for FlakySink {
    async fn put(&self, item: &Item) -> SinkResult<ItemKey> {
        if item.title.contains("poison") {
            self.rejected_puts.fetch_add(1, Ordering::SeqCst);
            return Err(SinkError::Unavailable("injected outage".to_string()));
        }
        self.inner.put(item).await
    }

    async fn get(&self, key: &ItemKey) -> SinkResult<Option<Item>> {
        self.inner.get(key).await
    }

    async fn count(&self) -> SinkResult<u64> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn test_sink_outage_abandons_page_but_crawl_continues() {
    let server = MockServer::start().await;
    let url = server.uri();

    mount_listing(
        &server,
        "1",
        listing_page(
            &[
                listing_row("Page one A", "https://example.com/1a"),
                listing_row("Page one B", "https://example.com/1b"),
            ],
            Some("news?p=2"),
        ),
        1,
    )
    .await;

    // Both of page 2's items hit the injected outage
    mount_listing(
        &server,
        "2",
        listing_page(
            &[
                listing_row("poison A", "https://example.com/2a"),
                listing_row("poison B", "https://example.com/2b"),
            ],
            Some("news?p=3"),
        ),
        1,
    )
    .await;

    mount_listing(
        &server,
        "3",
        listing_page(
            &[
                listing_row("Page three A", "https://example.com/3a"),
                listing_row("Page three B", "https://example.com/3b"),
            ],
            None,
        ),
        1,
    )
    .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[1-3]")]);
    let sink = Arc::new(FlakySink::new());
    let engine = CrawlEngine::new(config, sink.clone()).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    // All three pages were fetched; only page 2's items were lost
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.items_stored, 4);
    assert_eq!(report.items_abandoned, 2);

    // The first poisoned item exhausted its budget (1 try + 2 retries); the
    // rest of the page was abandoned without further attempts.
    assert_eq!(sink.rejected_puts.load(Ordering::SeqCst), 3);

    // Items from the healthy pages occupy a dense key range
    let entries = read_all(sink.as_ref()).await.expect("Read-back failed");
    let titles: Vec<&str> = entries.iter().map(|(_, item)| item.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Page one A", "Page one B", "Page three A", "Page three B"]
    );
    for (position, (key, _)) in entries.iter().enumerate() {
        assert_eq!(key.index(), position as u64);
    }
}

#[tokio::test]
async fn test_links_outside_pattern_scope_are_ignored() {
    let scoped = MockServer::start().await;
    let offsite = MockServer::start().await;
    let url = scoped.uri();

    // The listing links both to an out-of-pattern page on another server
    // and to a high page number excluded by the pattern.
    let body = format!(
        r#"<html><body>
        <a href="{}/news?p=9">Far page</a>
        <a href="{}/news?p=2">Elsewhere</a>
        </body></html>"#,
        url,
        offsite.uri()
    );
    mount_listing(&scoped, "1", body, 1).await;
    mount_listing(&scoped, "9", listing_page(&[], None), 0).await;
    mount_listing(&offsite, "2", listing_page(&[], None), 0).await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[1-3]")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_fetched, 1);
    // Only the seed ever entered the frontier
    assert_eq!(report.links_enqueued, 1);
}

#[tokio::test]
async fn test_robots_disallow_skips_page() {
    let server = MockServer::start().await;
    let url = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /news"))
        .expect(1)
        .mount(&server)
        .await;

    // The listing itself must never be requested
    mount_listing(&server, "1", listing_page(&[], None), 0).await;

    let mut config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    config.crawler.respect_robots = true;

    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.reason, FinishReason::Exhausted);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.pages_disallowed, 1);
    assert_eq!(report.items_stored, 0);
}

#[tokio::test]
async fn test_redirects_are_followed_transparently() {
    let server = MockServer::start().await;
    let url = server.uri();

    Mock::given(method("GET"))
        .and(path("/old-news"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/news?p=1", url).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_listing(
        &server,
        "1",
        listing_page(&[listing_row("Moved story", "https://example.com/m")], None),
        1,
    )
    .await;

    let mut config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    config.seeds = vec![SeedEntry {
        url: format!("{}/old-news", url),
    }];

    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let report = engine
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.items_stored, 1);
}

#[tokio::test]
async fn test_cancellation_stops_the_run_promptly() {
    let server = MockServer::start().await;
    let url = server.uri();

    // The seed page hangs long enough that only cancellation can end the
    // fetch quickly.
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("p", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[], None))
                .set_delay(Duration::from_secs(20)),
        )
        .mount(&server)
        .await;

    let config = create_test_config(&url, vec![page_pattern(&url, "[0-9]+")]);
    let sink = Arc::new(MemorySink::default());
    let engine = CrawlEngine::new(config, sink).expect("Failed to build engine");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = engine.run(cancel).await.expect("Crawl failed");

    assert_eq!(report.reason, FinishReason::Cancelled);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.items_stored, 0);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "Cancellation took too long: {:?}",
        started.elapsed()
    );
}
