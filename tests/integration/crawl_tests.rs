//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full discover-fetch-parse-store cycle end-to-end.

use fable_crawler::config::{
    Config, DatabaseConfig, PacingConfig, SourceConfig, UserAgentConfig,
};
use fable_crawler::crawler::{
    run_crawl, HttpFetcher, PacingSchedule, Pipeline, RecordingPacer, Spider,
};
use fable_crawler::storage::{RunStatus, SqliteStore};
use fable_crawler::{FableError, TransportError};
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at `base_url` with no pacing delays
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
            ..SourceConfig::default()
        },
        pacing: PacingConfig {
            delay_ms: 0,
            batch_size: 10,
            batch_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        database: DatabaseConfig {
            path: db_path.to_string_lossy().into_owned(),
            collection: "aesop".to_string(),
        },
    }
}

fn test_user_agent() -> UserAgentConfig {
    create_test_config("http://unused/", Path::new("unused.db")).user_agent
}

fn story_page(n: usize) -> String {
    format!(
        r#"<html><head><title>Fable {n}</title></head><body>
        <p>Fable number {n} begins.</p>
        <p>And then it ends.</p>
        <blockquote>Moral {n}</blockquote>
        </body></html>"#
    )
}

fn toc_page(hrefs: &[String]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
        <ul class="nav"><li><a href="about.html">About</a></li></ul>
        <ul class="toc">{items}</ul>
        </body></html>"#
    )
}

fn story_hrefs(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{:03}.html", i + 2)).collect()
}

/// Mounts a table of contents and `count` story pages under /aesop/
async fn mount_collection(server: &MockServer, count: usize) -> Vec<String> {
    let hrefs = story_hrefs(count);

    Mock::given(method("GET"))
        .and(path("/aesop/001.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(toc_page(&hrefs))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    for (i, href) in hrefs.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/aesop/{href}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(story_page(i + 1))
                    .insert_header("content-type", "text/html"),
            )
            .mount(server)
            .await;
    }

    hrefs
}

#[tokio::test]
async fn test_full_crawl_stores_every_story() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());
    let hrefs = mount_collection(&mock_server, 3).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("fables.db");
    let config = create_test_config(&base_url, &db_path);

    let report = run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect("Crawl failed");

    assert_eq!(report.links, 3);
    assert_eq!(report.stored, 3);
    assert!(!report.cancelled);

    let storage = SqliteStore::new(&db_path, "aesop").expect("Failed to open DB");
    let pages = storage.all_pages().expect("Failed to read pages");
    assert_eq!(pages.len(), 3);

    for (i, (page, href)) in pages.iter().zip(&hrefs).enumerate() {
        assert_eq!(page.link, format!("{base_url}{href}"));
        assert_eq!(page.html, story_page(i + 1).into_bytes());
        assert_eq!(
            page.story,
            vec![
                format!("Fable number {} begins.", i + 1),
                "And then it ends.".to_string()
            ]
        );
        assert_eq!(page.quote, vec![format!("Moral {}", i + 1)]);
    }

    let runs = storage.recent_runs(1).expect("Failed to read runs");
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].config_hash, "test-hash");
    assert_eq!(runs[0].pages_stored, 3);
}

#[tokio::test]
async fn test_fetch_failure_aborts_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());
    let hrefs = story_hrefs(5);

    Mock::given(method("GET"))
        .and(path("/aesop/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(toc_page(&hrefs)))
        .mount(&mock_server)
        .await;

    for (i, href) in hrefs.iter().enumerate() {
        let response = if i == 2 {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_string(story_page(i + 1))
        };
        // Pages after the failure must never be requested
        let expected = if i <= 2 { 1 } else { 0 };
        Mock::given(method("GET"))
            .and(path(format!("/aesop/{href}")))
            .respond_with(response)
            .expect(expected)
            .mount(&mock_server)
            .await;
    }

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("fables.db");
    let config = create_test_config(&base_url, &db_path);

    let err = run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect_err("Crawl should abort");

    match &err {
        FableError::Aborted {
            position,
            stored,
            link,
            source,
        } => {
            assert_eq!(*position, 2);
            assert_eq!(*stored, 2);
            assert_eq!(link, &format!("{base_url}{}", hrefs[2]));
            assert!(matches!(
                source.as_ref(),
                FableError::Transport(TransportError::Status { status: 500, .. })
            ));
        }
        other => panic!("Expected abort, got {other:?}"),
    }

    let storage = SqliteStore::new(&db_path, "aesop").expect("Failed to open DB");
    assert_eq!(storage.count_pages().unwrap(), 2);

    let runs = storage.recent_runs(1).unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(runs[0].pages_stored, 2);
    assert_eq!(runs[0].links_discovered, 5);
}

#[tokio::test]
async fn test_missing_index_fails_without_writes() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/aesop/001.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("fables.db");
    let config = create_test_config(&base_url, &db_path);

    let err = run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect_err("Crawl should fail");
    assert!(matches!(
        err,
        FableError::Transport(TransportError::Status { status: 404, .. })
    ));

    let storage = SqliteStore::new(&db_path, "aesop").expect("Failed to open DB");
    assert_eq!(storage.count_pages().unwrap(), 0);
    assert!(storage.recent_runs(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_table_of_contents() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/aesop/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(toc_page(&[])))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(&base_url, &dir.path().join("fables.db"));

    let err = run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect_err("Empty table of contents should be rejected");
    assert!(matches!(err, FableError::NoLinksDiscovered { .. }));
}

#[tokio::test]
async fn test_rerun_appends_duplicates() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());
    mount_collection(&mock_server, 2).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("fables.db");
    let config = create_test_config(&base_url, &db_path);

    run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect("First crawl failed");
    run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect("Second crawl failed");

    let storage = SqliteStore::new(&db_path, "aesop").expect("Failed to open DB");
    assert_eq!(storage.count_pages().unwrap(), 4);
    assert_eq!(storage.count_distinct_links().unwrap(), 2);

    let copies = storage
        .get_pages_by_link(&format!("{base_url}002.html"))
        .unwrap();
    assert_eq!(copies.len(), 2);
    assert_eq!(copies[0], copies[1]);
    assert_eq!(storage.recent_runs(10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_pipeline_paces_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());
    let hrefs = mount_collection(&mock_server, 12).await;
    let links: Vec<String> = hrefs.iter().map(|h| format!("{base_url}{h}")).collect();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut storage =
        SqliteStore::new(&dir.path().join("fables.db"), "aesop").expect("Failed to open DB");

    let fetcher = HttpFetcher::from_config(&test_user_agent()).expect("Failed to build client");
    let mut pipeline = Pipeline::new(fetcher, RecordingPacer::new(), PacingSchedule::default());

    let report = pipeline
        .run(&links, &mut storage)
        .await
        .expect("Pipeline failed");

    assert_eq!(report.stored, 12);
    assert_eq!(storage.count_pages().unwrap(), 12);

    let waits = pipeline.pacer().waits();
    assert_eq!(waits.len(), 13);
    assert_eq!(
        waits
            .iter()
            .filter(|&&w| w == Duration::from_secs(10))
            .count(),
        1
    );
    assert_eq!(pipeline.pacer().total(), Duration::from_secs(12 * 3 + 10));
}

#[tokio::test]
async fn test_declared_charset_is_honoured() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/aesop/", mock_server.uri());
    let hrefs = vec!["002.html".to_string()];
    let page: &[u8] =
        b"<html><head><meta charset=\"iso-8859-1\"></head><body><p>Le corbeau et le renard, fa\xe7on \xe9l\xe9gante</p></body></html>";

    Mock::given(method("GET"))
        .and(path("/aesop/001.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(toc_page(&hrefs)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/aesop/002.html"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(page))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("fables.db");
    let config = create_test_config(&base_url, &db_path);

    run_crawl(&config, Spider::Aesop, "test-hash", None, ProgressBar::hidden())
        .await
        .expect("Crawl failed");

    let storage = SqliteStore::new(&db_path, "aesop").expect("Failed to open DB");
    let pages = storage.all_pages().unwrap();
    assert_eq!(pages[0].html, page);
    assert_eq!(
        pages[0].story,
        vec!["Le corbeau et le renard, fa\u{e7}on \u{e9}l\u{e9}gante"]
    );
}
