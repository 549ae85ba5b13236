//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run domain
//! crawls end-to-end. Mock servers speak plain HTTP, so every crawl here
//! also exercises the https → http fallback of seeding and robots.txt.

use category_crawler::config::{CrawlerConfig, UserAgentConfig};
use category_crawler::crawler::{
    fetch_page, DomainCrawl, DomainReport, Job, JobScheduler, RetryPolicy,
};
use category_crawler::storage::{
    Page, PageStore, RunRecord, RunStatus, SqliteStorage, StorageError, StorageResult,
};
use category_crawler::{CrawlContext, CrawlError};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings tuned for fast tests
fn test_settings() -> CrawlerConfig {
    CrawlerConfig {
        max_pages_per_domain: 50,
        request_timeout_ms: 2000,
        politeness_delay_ms: 5,
        max_workers_per_domain: 4,
        max_global_workers: 4,
        max_retries: 2,
        retry_base_delay_ms: 10,
        queue_capacity: 64,
        idle_timeout_ms: 100,
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: Some("https://example.com/contact".to_string()),
        contact_email: Some("test@example.com".to_string()),
    }
}

fn context_with_store(
    settings: CrawlerConfig,
    store: Arc<dyn PageStore>,
) -> Arc<CrawlContext> {
    Arc::new(CrawlContext::new(settings, &user_agent(), store).expect("Failed to build context"))
}

fn context(settings: CrawlerConfig) -> (Arc<CrawlContext>, Arc<SqliteStorage>) {
    let store = Arc::new(SqliteStorage::in_memory().expect("Failed to open database"));
    (context_with_store(settings, store.clone()), store)
}

/// `host:port` of a mock server, used as the crawl domain
fn domain_of(server: &MockServer) -> String {
    server
        .uri()
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn job(server: &MockServer) -> Job {
    Job {
        category: "test".to_string(),
        domain: domain_of(server),
    }
}

fn html(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html",
    )
}

fn links(paths: &[&str]) -> String {
    paths
        .iter()
        .map(|p| format!(r#"<a href="{}">{}</a>"#, p, p))
        .collect()
}

/// Mounts the HEAD probe and a permissive robots.txt
async fn mount_basics(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\n"))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Number of GET requests the server received for paths matching `pred`
async fn get_count(server: &MockServer, pred: impl Fn(&str) -> bool) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string() == "GET" && pred(r.url.path()))
        .count()
}

/// Collects formatted tracing output for assertions
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Installs a warn-level subscriber for the current thread
fn capture_warnings() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    (capture, tracing::subscriber::set_default(subscriber))
}

async fn run_crawl(ctx: Arc<CrawlContext>, server: &MockServer) -> DomainReport {
    tokio::time::timeout(
        Duration::from_secs(30),
        DomainCrawl::new(ctx, job(server), CancellationToken::new()).run(),
    )
    .await
    .expect("Crawl did not finish in time")
    .expect("Crawl failed")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(
        &server,
        "/",
        html(
            "Home",
            &format!(
                r#"<p>Welcome home</p><a href="{}/page1">Page 1</a><a href="/page2">Page 2</a>"#,
                server.uri()
            ),
        ),
    )
    .await;
    mount_page(&server, "/page1", html("Page 1", "<p>Content 1</p>")).await;
    mount_page(
        &server,
        "/page2",
        ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>  Page
               2 </title><meta name="description" content="Second page"></head></html>"#,
            "text/html; charset=utf-8",
        ),
    )
    .await;

    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    // The mock only speaks http, so seeding falls back from https
    assert_eq!(report.seed.scheme(), "http");
    assert_eq!(report.pages_crawled, 3);
    assert!(report.robots_active);

    let pages = store.list_pages("test").unwrap();
    assert_eq!(pages.len(), 3);

    let home = pages.iter().find(|p| p.title == "Home").unwrap();
    assert_eq!(home.snippet, "Welcome home");
    assert_eq!(home.category, "test");

    let second = pages.iter().find(|p| p.url.ends_with("/page2")).unwrap();
    assert_eq!(second.title, "Page 2");
    assert_eq!(second.snippet, "Second page");
}

#[tokio::test]
async fn test_page_cap_stops_crawl() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(&server, "/", html("Home", &links(&["/1", "/2", "/3", "/4", "/5"]))).await;
    for i in 1..=5 {
        mount_page(&server, &format!("/{}", i), html(&format!("Page {}", i), "")).await;
    }

    let settings = CrawlerConfig {
        max_pages_per_domain: 2,
        ..test_settings()
    };
    let (ctx, store) = context(settings);
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(store.count_pages().unwrap(), 2);
    assert!(get_count(&server, |p| p != "/robots.txt").await <= 2);
}

#[tokio::test]
async fn test_robots_unavailable_fails_open() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    mount_page(&server, "/", html("Home", &links(&["/private/a", "/b"]))).await;
    mount_page(&server, "/private/a", html("A", "")).await;
    mount_page(&server, "/b", html("B", "")).await;

    let (logs, _guard) = capture_warnings();
    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    assert!(!report.robots_active);
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(store.count_pages().unwrap(), 3);

    let output = logs.contents();
    assert_eq!(output.matches("robots.txt unavailable").count(), 1, "{}", output);
    assert_eq!(output.matches("all paths allowed").count(), 1, "{}", output);
}

#[tokio::test]
async fn test_robots_disallowed_paths_never_requested() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        html("Home", &links(&["/private", "/private/a", "/private-b", "/public"])),
    )
    .await;
    mount_page(&server, "/private", html("P", "")).await;
    mount_page(&server, "/private/a", html("PA", "")).await;
    mount_page(&server, "/private-b", html("PB", "")).await;
    mount_page(&server, "/public", html("Public", "")).await;

    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    assert!(report.robots_active);
    assert_eq!(get_count(&server, |p| p.starts_with("/private")).await, 0);
    assert_eq!(get_count(&server, |p| p == "/public").await, 1);
    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_cross_domain_links_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    mount_basics(&server).await;
    mount_basics(&other).await;
    mount_page(&other, "/", html("Other", "")).await;

    mount_page(
        &server,
        "/",
        html(
            "Home",
            &format!(
                r#"<a href="{}/">Other server</a><a href="https://unrelated.example/">Elsewhere</a>"#,
                other.uri()
            ),
        ),
    )
    .await;

    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(store.count_pages().unwrap(), 1);
    assert!(other.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(
        &server,
        "/",
        html("Home", &links(&["/a", "/a", "/a#top", "/a#bottom", "/"])),
    )
    .await;
    mount_page(&server, "/a", html("A", &links(&["/", "/a"]))).await;

    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(get_count(&server, |p| p == "/a").await, 1);
    assert_eq!(get_count(&server, |p| p == "/").await, 1);
    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_redirect_persists_final_url() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(&server, "/", html("Home", &links(&["/old"]))).await;
    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri()).as_str()),
    )
    .await;
    mount_page(&server, "/new", html("New", "")).await;

    let (ctx, store) = context(test_settings());
    run_crawl(ctx, &server).await;

    let pages = store.list_pages("test").unwrap();
    let moved = pages.iter().find(|p| p.title == "New").unwrap();
    assert!(moved.url.ends_with("/new"));
}

#[tokio::test]
async fn test_transport_errors_retried_then_abandoned() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/slow",
        html("Slow", "").set_delay(Duration::from_millis(500)),
    )
    .await;

    let settings = CrawlerConfig {
        request_timeout_ms: 100,
        ..test_settings()
    };
    let (ctx, _store) = context(settings);
    let url = url::Url::parse(&format!("{}/slow", server.uri())).unwrap();
    let policy = RetryPolicy::new(2, Duration::from_millis(10));

    let result = fetch_page(&ctx.client, &url, &policy).await;

    match result {
        Err(CrawlError::FetchFailed { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected FetchFailed, got {:?}", other.map(|p| p.final_url)),
    }
    assert_eq!(get_count(&server, |p| p == "/slow").await, 3);
}

#[tokio::test]
async fn test_rejected_responses_not_retried() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/data.json",
        ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
    )
    .await;
    mount_page(&server, "/missing", ResponseTemplate::new(404)).await;

    let (ctx, _store) = context(test_settings());
    let policy = RetryPolicy::new(2, Duration::from_millis(10));

    for page in ["/data.json", "/missing"] {
        let url = url::Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
        let result = fetch_page(&ctx.client, &url, &policy).await;
        assert!(matches!(result, Err(CrawlError::FetchRejected { .. })));
        assert_eq!(get_count(&server, |p| p == page).await, 1);
    }
}

#[tokio::test]
async fn test_non_html_pages_skipped_in_crawl() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(&server, "/", html("Home", &links(&["/feed.xml", "/gone", "/ok"]))).await;
    mount_page(
        &server,
        "/feed.xml",
        ResponseTemplate::new(200).set_body_raw("<rss/>", "application/rss+xml"),
    )
    .await;
    mount_page(&server, "/gone", ResponseTemplate::new(404)).await;
    mount_page(&server, "/ok", html("Ok", "")).await;

    let (ctx, store) = context(test_settings());
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_per_domain_worker_limit() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    let paths: Vec<String> = (0..12).map(|i| format!("/p{}", i)).collect();
    let refs: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
    mount_page(&server, "/", html("Home", &links(&refs))).await;
    for p in &paths {
        mount_page(&server, p, html(p, "").set_delay(Duration::from_millis(100))).await;
    }

    let settings = CrawlerConfig {
        max_workers_per_domain: 3,
        politeness_delay_ms: 1,
        ..test_settings()
    };
    let (ctx, store) = context(settings);
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 13);
    assert_eq!(store.count_pages().unwrap(), 13);
    assert!(report.peak_workers >= 1);
    assert!(report.peak_workers <= 3);
}

#[tokio::test]
async fn test_cancellation_stops_dispatch() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    let paths: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
    let refs: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
    mount_page(&server, "/", html("Home", &links(&refs))).await;
    for p in &paths {
        mount_page(&server, p, html(p, "").set_delay(Duration::from_millis(300))).await;
    }

    let settings = CrawlerConfig {
        max_workers_per_domain: 2,
        politeness_delay_ms: 1,
        ..test_settings()
    };
    let (ctx, store) = context(settings);
    let cancel = CancellationToken::new();
    let crawl = tokio::spawn(DomainCrawl::new(ctx, job(&server), cancel.clone()).run());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let requested_at_cancel = get_count(&server, |p| p.starts_with("/p")).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), crawl)
        .await
        .expect("Crawl did not stop after cancellation")
        .unwrap()
        .unwrap();

    assert!(report.pages_crawled < 11);
    assert_eq!(store.count_pages().unwrap() as usize, report.pages_crawled);

    // Only requests already on the wire when the signal fired may land
    let requested_after = get_count(&server, |p| p.starts_with("/p")).await;
    assert!(
        requested_after <= requested_at_cancel + 2,
        "{} requests at cancel, {} after",
        requested_at_cancel,
        requested_after
    );

    // Nothing new goes out once the crawl has returned
    let requested = get_count(&server, |p| p.starts_with("/p")).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(get_count(&server, |p| p.starts_with("/p")).await, requested);
}

/// A sink whose writes never succeed
enum FailingStore {
    Rejecting,
    Panicking,
}

impl PageStore for FailingStore {
    fn append_page(&self, page: &Page) -> StorageResult<()> {
        match self {
            Self::Rejecting => Err(StorageError::Rejected("read-only".to_string())),
            Self::Panicking => panic!("sink crashed writing {}", page.url),
        }
    }

    fn count_pages(&self) -> StorageResult<u64> {
        Ok(0)
    }

    fn count_pages_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        Ok(Vec::new())
    }

    fn list_pages(&self, _category: &str) -> StorageResult<Vec<Page>> {
        Ok(Vec::new())
    }

    fn start_run(&self, _config_hash: &str) -> StorageResult<i64> {
        Ok(1)
    }

    fn finish_run(&self, _run_id: i64, _status: RunStatus, _pages: u64) -> StorageResult<()> {
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_persist_failures_still_count_toward_cap() {
    let server = MockServer::start().await;
    mount_basics(&server).await;

    mount_page(&server, "/", html("Home", &links(&["/1", "/2", "/3", "/4"]))).await;
    for i in 1..=4 {
        mount_page(&server, &format!("/{}", i), html("Page", "")).await;
    }

    let settings = CrawlerConfig {
        max_pages_per_domain: 2,
        ..test_settings()
    };
    let ctx = context_with_store(settings, Arc::new(FailingStore::Rejecting));
    let report = run_crawl(ctx, &server).await;

    assert_eq!(report.pages_crawled, 2);
}

#[tokio::test]
async fn test_panicking_worker_releases_its_page_slot() {
    let server = MockServer::start().await;
    mount_basics(&server).await;
    mount_page(&server, "/", html("Home", &links(&["/a"]))).await;
    mount_page(&server, "/a", html("A", "")).await;

    let settings = CrawlerConfig {
        max_pages_per_domain: 1,
        ..test_settings()
    };
    let ctx = context_with_store(settings, Arc::new(FailingStore::Panicking));

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        DomainCrawl::new(ctx, job(&server), CancellationToken::new()).run(),
    )
    .await
    .expect("Crawl hung after a worker panic")
    .expect("Crawl failed");

    assert_eq!(report.pages_crawled, 0);
}

#[tokio::test]
async fn test_scheduler_isolates_failed_domains() {
    let good = MockServer::start().await;
    mount_basics(&good).await;
    mount_page(&good, "/", html("Home", &links(&["/a"]))).await;
    mount_page(&good, "/a", html("A", "")).await;

    let (ctx, store) = context(test_settings());
    let scheduler = JobScheduler::new(ctx);
    let jobs = vec![
        Job {
            category: "broken".to_string(),
            domain: "127.0.0.1:1".to_string(),
        },
        job(&good),
    ];

    let summary = scheduler.run(jobs, &CancellationToken::new()).await;

    assert_eq!(summary.domains_completed, 1);
    assert_eq!(summary.domains_failed, 1);
    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_scheduler_global_limit() {
    let mut servers = Vec::new();
    for _ in 0..3 {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        mount_page(&server, "/", html("Home", "")).await;
        servers.push(server);
    }

    let settings = CrawlerConfig {
        max_global_workers: 1,
        ..test_settings()
    };
    let (ctx, store) = context(settings);
    let scheduler = JobScheduler::new(ctx);
    let jobs = servers.iter().map(job).collect();

    let summary = scheduler.run(jobs, &CancellationToken::new()).await;

    assert_eq!(summary.domains_completed, 3);
    assert_eq!(summary.peak_domain_crawls, 1);
    assert_eq!(store.count_pages().unwrap(), 3);
}

#[tokio::test]
async fn test_run_tracking_round_trip() {
    let store = SqliteStorage::in_memory().unwrap();
    let run_id = store.start_run("deadbeef").unwrap();
    store.finish_run(run_id, RunStatus::Completed, 5).unwrap();

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pages_crawled, 5);
}
