//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, including resumption from the
//! ledger and queue files.

use campus_crawler::config::{
    Config, CrawlerConfig, MembershipBackend, OutputConfig, ScopeConfig, UserAgentConfig,
};
use campus_crawler::crawler::{CrawlStatus, Supervisor};
use campus_crawler::storage::{read_url_list, PageRecord};
use std::fs;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration scoped to the mock server's host
fn create_test_config(dir: &Path, base_url: &str) -> Config {
    let file = |name: &str| dir.join(name).to_string_lossy().into_owned();
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    Config {
        crawler: CrawlerConfig {
            workers: 4,
            request_timeout: 5000,
            politeness_delay: 1,
            dequeue_timeout: 50,
            status_interval: 60,
            checkpoint_interval: 60,
            milestone_interval: 50,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.edu/contact".to_string(),
            contact_email: "test@example.edu".to_string(),
        },
        output: OutputConfig {
            pages_dir: file("pages"),
            scraped_file: file("scraped_urls.txt"),
            queue_file: file("queued_urls.txt"),
            checkpoint_file: file("checkpoint.txt"),
            index_path: file("membership.db"),
            ..OutputConfig::default()
        },
        scope: ScopeConfig::new(vec![format!("{}/", base_url)], vec![host]),
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn read_page(dir: &Path, index: u64) -> PageRecord {
    let path = dir.join("pages").join(format!("{:05}.txt", index));
    let contents = fs::read_to_string(&path).expect("page file should exist");
    PageRecord::parse(index, &contents).expect("page file should parse")
}

fn sorted(mut urls: Vec<String>) -> Vec<String> {
    urls.sort();
    urls
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <h1>Welcome</h1>
            <a href="{base}/page1">Page 1</a>
            <a href="/page2/">Page 2</a>
            <a href="/page1?utm_source=nav">Page 1 again</a>
            <a href="https://offsite.example.org/">Elsewhere</a>
            <a href="/brochure.pdf">Brochure</a>
            </body></html>"#
        ),
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><body><p>Content 1</p><a href="/">Home</a></body></html>"#.to_string(),
    )
    .await;
    mount_html(
        &server,
        "/page2",
        r#"<html><body><p>Content 2</p><a href="/page1">Page 1</a></body></html>"#.to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);

    let report = Supervisor::new(config, "test-hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .expect("Crawl should succeed");

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.stats.pages_stored, 3);
    assert_eq!(report.scraped_total, 3);
    assert_eq!(report.remaining, 0);

    let ledger = read_url_list(&dir.path().join("scraped_urls.txt")).unwrap();
    assert_eq!(
        ledger,
        sorted(vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
        ])
    );
    assert!(read_url_list(&dir.path().join("queued_urls.txt"))
        .unwrap()
        .is_empty());

    // The seed is always stored first
    let first = read_page(dir.path(), 0);
    assert_eq!(first.source_url, format!("{}/", base));
    assert!(first.body.starts_with("Home\nWelcome\nPage 1"));

    let mut stored: Vec<String> = (0..3).map(|i| read_page(dir.path(), i).source_url).collect();
    stored.sort();
    assert_eq!(stored, ledger);
    assert!(!dir.path().join("pages").join("00003.txt").exists());

    let checkpoint = fs::read_to_string(dir.path().join("checkpoint.txt")).unwrap();
    assert!(checkpoint.contains("Scraped: 3\n"));
    assert!(checkpoint.contains("Queue: 0\n"));
    assert!(checkpoint.contains("Config hash: test-hash\n"));
    assert!(checkpoint.contains("Phase: stopped\n"));
}

#[tokio::test]
async fn test_non_html_content_is_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/handbook">Handbook</a><a href="/feed">Feed</a>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/handbook"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("no content type"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);

    let report = Supervisor::new(config, "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.stats.pages_stored, 1);
    assert_eq!(report.stats.non_html, 2);

    let ledger = read_url_list(&dir.path().join("scraped_urls.txt")).unwrap();
    assert_eq!(ledger, vec![format!("{}/", base)]);
    assert!(!dir.path().join("pages").join("00001.txt").exists());
}

#[tokio::test]
async fn test_failures_do_not_abort_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/broken">Broken</a><a href="/busy">Busy</a><a href="/ok">Ok</a>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_html(&server, "/ok", "<p>Fine</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);

    let report = Supervisor::new(config, "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.stats.pages_stored, 2);
    assert_eq!(report.stats.total_failures(), 3);

    let ledger = read_url_list(&dir.path().join("scraped_urls.txt")).unwrap();
    assert_eq!(
        ledger,
        sorted(vec![format!("{}/", base), format!("{}/ok", base)])
    );
}

#[tokio::test]
async fn test_resume_skips_scraped_and_continues_numbering() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Already scraped in a previous run: must not be fetched again
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/page1">1</a>"#.to_string()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<p>One</p><a href="/">Home</a><a href="/page2">2</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<p>Two</p>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::write(
        dir.path().join("pages").join("00000.txt"),
        format!("URL: {}/\n\nHome", base),
    )
    .unwrap();
    fs::write(
        dir.path().join("scraped_urls.txt"),
        format!("{}/\n", base),
    )
    .unwrap();
    // A crash can leave a scraped URL in the queue file too
    fs::write(
        dir.path().join("queued_urls.txt"),
        format!("{base}/page1\n{base}/\n"),
    )
    .unwrap();

    let config = create_test_config(dir.path(), &base);
    let report = Supervisor::new(config, "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.recovery.scraped_loaded, 1);
    assert_eq!(report.recovery.queue_loaded, 1);
    assert_eq!(report.recovery.seeded, 0);
    assert_eq!(report.stats.pages_stored, 2);
    assert_eq!(report.scraped_total, 3);

    // Existing page untouched; new pages continue after it
    assert_eq!(read_page(dir.path(), 0).body, "Home");
    assert_eq!(read_page(dir.path(), 1).source_url, format!("{}/page1", base));
    assert_eq!(read_page(dir.path(), 2).source_url, format!("{}/page2", base));

    let ledger = read_url_list(&dir.path().join("scraped_urls.txt")).unwrap();
    assert_eq!(ledger.len(), 3);
}

#[tokio::test]
async fn test_second_run_after_completion_does_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Only page</p>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();

    let first = Supervisor::new(create_test_config(dir.path(), &base), "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(first.stats.pages_stored, 1);

    let second = Supervisor::new(create_test_config(dir.path(), &base), "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(second.status, CrawlStatus::Completed);
    assert_eq!(second.stats.pages_stored, 0);
    assert_eq!(second.recovery.seeded, 0);
    assert_eq!(second.scraped_total, 1);
}

#[tokio::test]
async fn test_fresh_ignores_ledger_but_keeps_numbering() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", "<p>Home again</p>".to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("pages")).unwrap();
    fs::write(
        dir.path().join("pages").join("00004.txt"),
        format!("URL: {}/old\n\nOld", base),
    )
    .unwrap();
    fs::write(dir.path().join("scraped_urls.txt"), format!("{}/\n", base)).unwrap();

    let report = Supervisor::new(create_test_config(dir.path(), &base), "hash", true)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.recovery.seeded, 1);
    assert_eq!(report.stats.pages_stored, 1);
    assert_eq!(read_page(dir.path(), 5).source_url, format!("{}/", base));
    assert_eq!(read_page(dir.path(), 4).body, "Old");
}

#[tokio::test]
async fn test_interrupt_saves_pending_work() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html(r#"<p>Slow home</p><a href="/page1">1</a>"#.to_string())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html("<p>One</p>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path(), &base);

    let report = Supervisor::new(config, "hash", false)
        .run_until(tokio::time::sleep(Duration::from_millis(100)))
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Interrupted);

    // The in-progress page was finished before stopping
    let ledger = read_url_list(&dir.path().join("scraped_urls.txt")).unwrap();
    assert_eq!(ledger, vec![format!("{}/", base)]);

    // Its discovered link is waiting for the next run
    let queue = read_url_list(&dir.path().join("queued_urls.txt")).unwrap();
    assert_eq!(queue, vec![format!("{}/page1", base)]);

    let checkpoint = fs::read_to_string(dir.path().join("checkpoint.txt")).unwrap();
    assert!(checkpoint.contains("Phase: stopped\n"));
}

#[tokio::test]
async fn test_sqlite_membership_backend() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/a", r#"<a href="/b">B</a>"#.to_string()).await;
    mount_html(&server, "/b", r#"<a href="/a">A</a>"#.to_string()).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path(), &base);
    config.output.membership = MembershipBackend::Sqlite;

    let report = Supervisor::new(config, "hash", false)
        .run_until(std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.stats.pages_stored, 3);
    assert!(dir.path().join("membership.db").exists());
}
