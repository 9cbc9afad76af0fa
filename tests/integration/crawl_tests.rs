//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use sumi_sweep::config::{
    Config, CrawlerConfig, DedupConfig, FetchConfig, OutputConfig, ScopeConfig, UserAgentConfig,
};
use sumi_sweep::crawler::run_crawl;
use sumi_sweep::frontier::{Dequeue, Frontier};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server from its root
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let file = |name: &str| dir.join(name).to_string_lossy().into_owned();
    Config {
        crawler: CrawlerConfig {
            workers: 2,
            crawl_delay: 10, // Very short for testing
            seeds: vec![format!("{}/", base_url)],
            sync_every: 2,
            empty_queue_retries: 2,
            empty_queue_backoff: 50,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        fetch: FetchConfig {
            read_timeout: 500,
            ..FetchConfig::default()
        },
        dedup: DedupConfig::default(),
        scope: ScopeConfig {
            domains: vec!["127.0.0.1".to_string()],
            path_restricted: vec![],
            max_url_length: 300,
            max_query_params: 5,
            max_path_depth: 10,
        },
        output: OutputConfig {
            ledger_path: file("ledger.db"),
            dedup_path: file("dedup.json"),
            stats_path: file("words.json"),
            report_path: file("report.txt"),
            status_interval: 1,
        },
    }
}

/// An HTML page with enough distinct words to pass every content filter
fn html_page(topic: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">next {}</a>"#, href, href.trim_start_matches('/')))
        .collect();
    format!(
        "<html><head><title>{topic}</title></head><body>\
         <p>{topic} research overview covers faculty projects, graduate seminars, \
         laboratory equipment, published papers, student awards and {topic} outreach events.</p>\
         {anchors}</body></html>"
    )
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_head_ok(server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_follows_links() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_head_ok(&server).await;
    mount_page(
        &server,
        "/",
        html_page("home", &["/physics", "/chemistry", "https://www.example.com/away"]),
    )
    .await;
    mount_page(&server, "/physics", html_page("physics", &["/"])).await;
    mount_page(&server, "/chemistry", html_page("chemistry", &["/physics"])).await;

    let config = create_test_config(&server.uri(), dir.path());
    let report_path = config.output.report_path.clone();

    let summary = run_crawl(config, true, CancellationToken::new())
        .await
        .unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.failed_workers, 0);
    assert_eq!(summary.retired, 3);
    assert_eq!(summary.status.discovered, 3);
    assert_eq!(summary.status.completed, 3);
    assert_eq!(summary.status.queue_size, 0);

    let report = std::fs::read_to_string(report_path).unwrap();
    assert!(report.contains("UNIQUE URLS: 3"));
    assert!(report.contains("127.0.0.1, 3"));
    assert!(report.contains("research"));
    assert!(dir.path().join("dedup.json").exists());
    assert!(dir.path().join("words.json").exists());
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", html_page("home", &["/private/secret", "/public"])).await;
    mount_page(&server, "/public", html_page("public", &[])).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("secret", &[]), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let summary = run_crawl(config, true, CancellationToken::new())
        .await
        .unwrap();

    // Disallowed URLs are retired without a request
    assert_eq!(summary.status.discovered, 3);
    assert_eq!(summary.status.completed, 3);
}

#[tokio::test]
async fn test_timed_out_fetch_is_retired() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_head_ok(&server).await;
    mount_page(&server, "/", html_page("home", &["/slow"])).await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("slow", &[]), "text/html")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let summary = run_crawl(config.clone(), true, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status.discovered, 2);
    assert_eq!(summary.status.completed, 2);

    // Resuming finds nothing left to do and never retries the slow page
    let resumed = run_crawl(config, false, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(resumed.retired, 0);
    assert_eq!(resumed.status.completed, 2);
}

#[tokio::test]
async fn test_duplicate_page_links_not_followed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_head_ok(&server).await;

    // Same visible text, different link targets
    let home = html_page("home", &["/copy"]).replace("next copy", "next page");
    let copy = html_page("home", &["/hidden"]).replace("next hidden", "next page");
    mount_page(&server, "/", home).await;
    mount_page(&server, "/copy", copy).await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("hidden", &[]), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let summary = run_crawl(config, true, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status.discovered, 2);
    assert_eq!(summary.status.completed, 2);
}

#[tokio::test]
async fn test_low_information_page_not_followed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_head_ok(&server).await;
    mount_page(
        &server,
        "/",
        format!(
            "<html><body>{}<a href=\"/next\">go</a></body></html>",
            " ".repeat(200)
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page("next", &[]), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let summary = run_crawl(config, true, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status.discovered, 1);
    assert_eq!(summary.status.completed, 1);
}

#[tokio::test]
async fn test_reload_restores_pending_urls() {
    let dir = TempDir::new().unwrap();
    let base_url = "http://127.0.0.1:9";
    let config = create_test_config(base_url, dir.path());

    {
        let frontier = Frontier::open(&config, true).unwrap();
        assert!(frontier.add_url("http://127.0.0.1:9/second").unwrap());

        let first = match frontier.get_tbd_url().unwrap() {
            Dequeue::Ready(url) => url,
            other => panic!("expected a ready URL, got {:?}", other),
        };
        assert_eq!(first.as_str(), "http://127.0.0.1:9/");
        frontier.mark_url_complete(&first).unwrap();
        frontier.sync().unwrap();
    }

    let frontier = Frontier::open(&config, false).unwrap();
    let status = frontier.get_status().unwrap();
    assert_eq!(status.discovered, 2);
    assert_eq!(status.completed, 1);
    assert_eq!(status.queue_size, 1);

    match frontier.get_tbd_url().unwrap() {
        Dequeue::Ready(url) => assert_eq!(url.as_str(), "http://127.0.0.1:9/second"),
        other => panic!("expected the pending URL, got {:?}", other),
    }
}
