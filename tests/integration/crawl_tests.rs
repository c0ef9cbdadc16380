//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, writing into temporary directories.

use corpus_ripple::config::{parse_config, Config};
use corpus_ripple::crawler::run_crawl;
use corpus_ripple::output::{OutputUnit, RecordSink, Sink};
use corpus_ripple::state::StopReason;
use corpus_ripple::ContentRecord;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Creates a southern-weekly configuration against the mock server
fn southern_weekly_config(base_url: &str, output_dir: &Path, terms: &[&str]) -> Config {
    let units = terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ");
    parse_config(&format!(
        r#"
[crawler]
unit-concurrency = 2
workers = 5

[fetch]
timeout-secs = 5

[[source]]
name = "southern-weekly"
adapter = "southern-weekly"
base-url = "{}/contents"
output-dir = "{}"
units = [{}]
"#,
        base_url,
        toml_path(output_dir),
        units
    ))
    .expect("valid test config")
}

fn term_list(ids: &[u32]) -> String {
    let contents = ids
        .iter()
        .map(|id| format!(r#"{{"id":{},"subject":"报道 {}"}}"#, id, id))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"code":200,"data":{{"contents":[{}]}}}}"#, contents)
}

fn article(id: u32) -> String {
    format!(
        r#"<html><body>
        <div class="nfzm-content__content">
          <blockquote class="nfzm-bq">导语 {id}</blockquote>
          <div class="nfzm-content__fulltext"><p>正文 {id} 第一段</p><p>正文 {id} 第二段</p></div>
        </div>
        </body></html>"#
    )
}

async fn mount_term_page(server: &MockServer, term: &str, page: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path("/contents"))
        .and(query_param("term_id", term))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/json"),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, id: u32, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/contents/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_terms_paginate_until_empty_page() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_term_page(&server, "2", "1", term_list(&[21, 22, 23]), 1).await;
    mount_term_page(&server, "2", "2", term_list(&[]), 1).await;
    mount_term_page(&server, "2", "3", term_list(&[24]), 0).await;
    mount_term_page(&server, "7", "1", term_list(&[71, 72, 73]), 1).await;
    mount_term_page(&server, "7", "2", term_list(&[]), 1).await;
    mount_term_page(&server, "7", "3", term_list(&[74]), 0).await;
    for id in [21, 22, 23, 71, 72, 73] {
        mount_article(&server, id, article(id), 1).await;
    }

    let config = southern_weekly_config(&server.uri(), output.path(), &["2", "7"]);
    let stats = run_crawl(&config, &[]).await.unwrap();

    let source = &stats.sources[0];
    assert_eq!(source.units.len(), 2);
    for unit in &source.units {
        assert_eq!(unit.list_pages, 2);
        assert_eq!(unit.items_discovered, 3);
        assert_eq!(unit.content_fetched, 3);
        assert_eq!(unit.records_written, 3);
        assert_eq!(unit.stop_reason, Some(StopReason::Exhausted));
    }

    for (term, ids) in [("2", [21, 22, 23]), ("7", [71, 72, 73])] {
        let file = output.path().join(format!("term_{}.txt", term));
        let content = std::fs::read_to_string(&file).unwrap();
        let records: Vec<&str> = content
            .split("\n\n")
            .filter(|r| !r.trim().is_empty())
            .collect();
        assert_eq!(records.len(), 3, "unexpected records in {}", file.display());
        for id in ids {
            assert!(content.contains(&format!("报道 {}\n导语 {}\n正文 {} 第一段\n正文 {} 第二段", id, id, id, id)));
        }
    }
}

#[tokio::test]
async fn test_concurrent_appends_do_not_interleave() {
    let output = TempDir::new().unwrap();
    let sink = Arc::new(Sink::new(output.path().join("out")));
    let unit = OutputUnit::new("2016");
    let body_line = "the quick brown fox jumps over the lazy dog ".repeat(40);

    let mut handles = Vec::new();
    for i in 0..50 {
        let sink = sink.clone();
        let unit = unit.clone();
        let record = ContentRecord::new(format!("record-{}\n{}\nend-{}", i, body_line, i));
        handles.push(tokio::spawn(async move { sink.append(&unit, &record).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let content = std::fs::read_to_string(sink.path_for(&unit)).unwrap();
    let records: Vec<&str> = content
        .split("\n\n")
        .filter(|r| !r.is_empty())
        .collect();
    assert_eq!(records.len(), 50);
    for record in records {
        let lines: Vec<&str> = record.lines().collect();
        assert_eq!(lines.len(), 3);
        let id = lines[0].strip_prefix("record-").unwrap();
        assert_eq!(lines[1], body_line);
        assert_eq!(lines[2], format!("end-{}", id));
    }
}

#[tokio::test]
async fn test_directory_creation_is_idempotent() {
    let output = TempDir::new().unwrap();
    let dir = output.path().join("english_data").join("China_Daily");
    std::fs::create_dir_all(&dir).unwrap();

    let first = Sink::new(&dir);
    let second = Sink::new(&dir);
    first
        .append(&OutputUnit::new("2015"), &ContentRecord::new("one"))
        .await
        .unwrap();
    second
        .append(&OutputUnit::new("2015"), &ContentRecord::new("two"))
        .await
        .unwrap();
    first.ensure_dir().await.unwrap();

    let content = std::fs::read_to_string(dir.join("2015.txt")).unwrap();
    assert_eq!(content, "one\n\ntwo\n\n");
}

#[tokio::test]
async fn test_parse_miss_writes_nothing() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_term_page(&server, "2", "1", term_list(&[21, 22, 23]), 1).await;
    mount_term_page(&server, "2", "2", term_list(&[]), 1).await;
    for id in [21, 22, 23] {
        mount_article(&server, id, "<html><body><div class='paywall'>订阅</div></body></html>".to_string(), 1).await;
    }

    let config = southern_weekly_config(&server.uri(), output.path(), &["2"]);
    let stats = run_crawl(&config, &[]).await.unwrap();

    let unit = &stats.sources[0].units[0];
    assert_eq!(unit.parse_misses, 3);
    assert_eq!(unit.records_written, 0);
    assert!(!output.path().join("term_2.txt").exists());
}

#[tokio::test]
async fn test_unreachable_host_terminates_gracefully() {
    let output = TempDir::new().unwrap();
    let config = southern_weekly_config("http://127.0.0.1:1", output.path(), &["2", "7"]);

    let stats = run_crawl(&config, &[]).await.unwrap();

    let source = &stats.sources[0];
    assert_eq!(source.units.len(), 2);
    for unit in &source.units {
        assert_eq!(unit.list_pages, 0);
        assert_eq!(unit.stop_reason, Some(StopReason::EmptyListFetch));
    }
    assert_eq!(stats.total_records_written(), 0);
}

#[tokio::test]
async fn test_items_without_url_are_never_fetched() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let list = r#"{"data":{"contents":[
        {"id":31,"subject":"有链接"},
        {"subject":"无链接"},
        {"id":"  ","subject":"空白"}
    ]}}"#;
    mount_term_page(&server, "3", "1", list.to_string(), 1).await;
    mount_term_page(&server, "3", "2", term_list(&[]), 1).await;
    mount_article(&server, 31, article(31), 1).await;

    let config = southern_weekly_config(&server.uri(), output.path(), &["3"]);
    let stats = run_crawl(&config, &[]).await.unwrap();

    let unit = &stats.sources[0].units[0];
    assert_eq!(unit.items_discovered, 3);
    assert_eq!(unit.items_discarded, 2);
    assert_eq!(unit.records_written, 1);

    let requests = server.received_requests().await.unwrap();
    let article_requests = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/contents/"))
        .count();
    assert_eq!(article_requests, 1);
}

#[tokio::test]
async fn test_failed_content_fetch_is_skipped() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_term_page(&server, "2", "1", term_list(&[21, 22]), 1).await;
    mount_term_page(&server, "2", "2", term_list(&[]), 1).await;
    mount_article(&server, 21, article(21), 1).await;
    Mock::given(method("GET"))
        .and(path("/contents/22"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = southern_weekly_config(&server.uri(), output.path(), &["2"]);
    let stats = run_crawl(&config, &[]).await.unwrap();

    let unit = &stats.sources[0].units[0];
    assert_eq!(unit.fetch_failures, 1);
    assert_eq!(unit.records_written, 1);
    assert_eq!(unit.stop_reason, Some(StopReason::Exhausted));
}

#[tokio::test]
async fn test_date_archive_pages_past_empty_day_until_cap() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/cndy/2015-01/01/index1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="content_1.htm">One</a><a href="content_1.htm"><img></a><a href="content_2.htm">Two</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cndy/2015-01/02/index1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No issue today</body></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cndy/2015-01/03/index1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="content_3.htm">Three</a>"#))
        .expect(0)
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/cndy/2015-01/01/content_{}.htm", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div class="lft_art"><h1>Headline {id}</h1></div><div id="Content"><p>Story {id}.</p></div>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = parse_config(&format!(
        r#"
[[source]]
name = "china-daily"
adapter = "china-daily"
base-url = "{}/cndy/"
output-dir = "{}"
years = {{ start = 2015, end = 2015 }}
max-pages = 2
"#,
        server.uri(),
        toml_path(output.path())
    ))
    .unwrap();

    let stats = run_crawl(&config, &[]).await.unwrap();

    let unit = &stats.sources[0].units[0];
    assert_eq!(unit.unit, "2015");
    assert_eq!(unit.list_pages, 2);
    assert_eq!(unit.records_written, 2);
    assert_eq!(unit.stop_reason, Some(StopReason::PageCap));

    let content = std::fs::read_to_string(output.path().join("2015.txt")).unwrap();
    assert!(content.contains("Headline 1\nStory 1."));
    assert!(content.contains("Headline 2\nStory 2."));
}

#[tokio::test]
async fn test_date_archive_skips_missing_day() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for (day, body) in [("01", r#"<a href="content_1.htm">One</a>"#), ("03", r#"<a href="content_3.htm">Three</a>"#)] {
        Mock::given(method("GET"))
            .and(path(format!("/cndy/2015-01/{}/index1.html", day)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/cndy/2015-01/02/index1.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    for (day, id) in [("01", 1), ("03", 3)] {
        Mock::given(method("GET"))
            .and(path(format!("/cndy/2015-01/{}/content_{}.htm", day, id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div class="lft_art"><h1>Headline {id}</h1></div><div id="Content"><p>Story {id}.</p></div>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = parse_config(&format!(
        r#"
[[source]]
name = "china-daily"
adapter = "china-daily"
base-url = "{}/cndy/"
output-dir = "{}"
years = {{ start = 2015, end = 2015 }}
max-pages = 3
"#,
        server.uri(),
        toml_path(output.path())
    ))
    .unwrap();

    let stats = run_crawl(&config, &[]).await.unwrap();

    let unit = &stats.sources[0].units[0];
    assert_eq!(unit.list_pages, 2);
    assert_eq!(unit.records_written, 2);
    assert_eq!(unit.stop_reason, Some(StopReason::PageCap));

    let content = std::fs::read_to_string(output.path().join("2015.txt")).unwrap();
    assert!(content.contains("Headline 1\nStory 1."));
    assert!(content.contains("Headline 3\nStory 3."));
}

#[tokio::test]
async fn test_source_filter() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = southern_weekly_config(&server.uri(), output.path(), &["2"]);

    let stats = run_crawl(&config, &["sina".to_string()]).await.unwrap();

    assert!(stats.sources.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
