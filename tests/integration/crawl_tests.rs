//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small paginated catalog and run the
//! full harvest cycle end-to-end over HTTP.

use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::{AbortReason, CrawlOutcome};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a validated configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &Path, page_ceiling: Option<u32>) -> Config {
    let ceiling = page_ceiling
        .map(|c| format!("page-ceiling = {}", c))
        .unwrap_or_default();
    let content = format!(
        r##"
[crawler]
{ceiling}
items-per-page = 24
max-retries = 3
retry-delay-ms = 10
ready-timeout-ms = 200
poll-interval-ms = 20

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[site]
list-url = "{base_url}/exhibitors?page={{page}}"
list-ready = "ul.exhibitors"
item-link = "ul.exhibitors li > a"
item-ready = "h1"

[output]
path = "{export}"
summary-path = "{summary}"

[schema]
section = "aside > div"
section-heading = "h5"

[[schema.fields]]
name = "Exhibitor"
kind = "text"
locator = "h1"

[[schema.fields]]
name = "Information"
kind = "text"
locator = "#info"

[[schema.fields]]
name = "Interests"
kind = "section"
heading = "Interests"
entry = "ul > li"
capacity = 2

[[schema.fields]]
name = "Remarks"
kind = "constant"
"##,
        export = dir.join("exhibitors.csv").display(),
        summary = dir.join("summary.md").display(),
    );
    parse_config(&content).expect("test config should be valid")
}

fn list_page(ids: &[&str]) -> String {
    let items: String = ids
        .iter()
        .map(|id| format!(r#"<li><a href="/exhibitors/{id}">{id}</a></li>"#))
        .collect();
    format!(r#"<html><body><ul class="exhibitors">{items}</ul></body></html>"#)
}

fn item_page(name: &str, info: Option<&str>, interests: &[&str]) -> String {
    let info = info
        .map(|text| format!(r#"<div id="info">{text}</div>"#))
        .unwrap_or_default();
    let interests: String = interests
        .iter()
        .map(|i| format!("<li>{i}</li>"))
        .collect();
    format!(
        r#"<html><body><h1>{name}</h1>{info}
        <aside><div><h5>Interests</h5><ul>{interests}</ul></div></aside>
        </body></html>"#
    )
}

async fn mount_list(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/exhibitors"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/exhibitors/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Page 1: acme, globex; page 2: initech
async fn mount_two_page_catalog(server: &MockServer) {
    mount_list(server, "1", list_page(&["acme", "globex"])).await;
    mount_list(server, "2", list_page(&["initech"])).await;
    mount_item(
        server,
        "acme",
        item_page("Acme", Some("Network gear"), &["5G", "IoT"]),
    )
    .await;
    mount_item(server, "globex", item_page("Globex", None, &["Cloud"])).await;
    mount_item(
        server,
        "initech",
        item_page("Initech", Some("Software"), &[]),
    )
    .await;
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("export should exist");
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_full_harvest_two_pages() {
    let server = MockServer::start().await;
    mount_two_page_catalog(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), Some(2));

    let report = run_harvest(&config, CancellationToken::new())
        .await
        .expect("harvest should flush");

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.records, 3);
    assert_eq!(report.stats.pages_visited, 2);

    let rows = read_rows(&report.export_path);
    assert_eq!(
        rows,
        vec![
            vec!["Exhibitor", "Information", "Interests 1", "Interests 2", "Remarks"],
            vec!["Acme", "Network gear", "5G", "IoT", ""],
            vec!["Globex", "N/A", "Cloud", "N/A", ""],
            vec!["Initech", "Software", "N/A", "N/A", ""],
        ]
    );

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("| Records exported | 3 |"));
}

#[tokio::test]
async fn test_empty_trailing_page_ends_harvest() {
    let server = MockServer::start().await;
    mount_two_page_catalog(&server).await;
    mount_list(&server, "3", list_page(&[])).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), None);

    let report = run_harvest(&config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.records, 3);
    assert_eq!(report.stats.pages_visited, 3);
}

#[tokio::test]
async fn test_not_found_past_last_page_ends_harvest() {
    let server = MockServer::start().await;
    mount_two_page_catalog(&server).await;
    Mock::given(method("GET"))
        .and(path("/exhibitors"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), None);

    let report = run_harvest(&config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert!(report.outcome.is_success());
    assert_eq!(report.records, 3);
    assert_eq!(report.stats.pages_visited, 2);
    assert_eq!(read_rows(&report.export_path).len(), 4);
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let server = MockServer::start().await;

    // First request for page 1 fails, later ones succeed
    Mock::given(method("GET"))
        .and(path("/exhibitors"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_two_page_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), Some(2));

    let report = run_harvest(&config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.records, 3);
    assert!(report.stats.retries >= 1);
}

#[tokio::test]
async fn test_failing_page_still_exports_collected_records() {
    let server = MockServer::start().await;
    mount_list(&server, "1", list_page(&["acme", "globex"])).await;
    mount_item(&server, "acme", item_page("Acme", None, &[])).await;
    mount_item(&server, "globex", item_page("Globex", None, &[])).await;
    Mock::given(method("GET"))
        .and(path("/exhibitors"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), None);

    let report = run_harvest(&config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        CrawlOutcome::Aborted(AbortReason::PageLoadFailed)
    );
    assert!(!report.outcome.is_success());

    let rows = read_rows(&report.export_path);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][0], "Acme");
    assert_eq!(rows[2][0], "Globex");
}

#[tokio::test]
async fn test_interrupt_before_start_writes_header() {
    let server = MockServer::start().await;
    mount_two_page_catalog(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), None);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_harvest(&config, cancel).await.unwrap();

    assert_eq!(
        report.outcome,
        CrawlOutcome::Aborted(AbortReason::ExternalInterrupt)
    );
    assert!(report.outcome.is_success());
    assert_eq!(report.records, 0);

    let rows = read_rows(&report.export_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Exhibitor");
}
