//! Full harvest runs: sitemap tree → HTML extraction → sink

use crate::{fast_policy, sitemap_index, url_set};
use sitemap_harvester::fetcher::{Fetcher, HttpFetcher};
use sitemap_harvester::output::JsonLinesSink;
use sitemap_harvester::storage::{ArticleStore, SqliteStore};
use sitemap_harvester::{ArticleStatus, HtmlMetaExtractor, Pipeline, Resolver};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_page(title: &str, post_id: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title} | Example News</title>
  <meta property="og:title" content="{title}">
  <meta name="author" content="Jane Reporter">
  <meta name="description" content="All about {title}.">
  <meta name="keywords" content="rust, sitemaps">
  <meta property="article:section" content="Technology">
  <meta property="article:tag" content="crawling">
  <meta property="og:image" content="https://cdn.example.com/{post_id}.jpg">
  <meta property="article:published_time" content="2024-03-01T09:30:00+01:00">
  <link rel="shortlink" href="https://example.com/?p={post_id}">
</head>
<body class="single postid-{post_id}">
  <nav><p>Menu</p></nav>
  <article>
    <p>First paragraph about {title}.</p>
    <p>Second paragraph.</p>
  </article>
</body>
</html>"#,
        title = title,
        post_id = post_id
    )
}

/// Serves an index with two leaves: three good articles and one missing page
///
/// Each good article page must be requested exactly `harvests` times.
async fn mount_site(server: &MockServer, harvests: u64) -> String {
    let base = server.uri();

    let leaves = [format!("{}/posts-1.xml", base), format!("{}/posts-2.xml", base)];
    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_index(&leaves)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts-1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(url_set(&[
            format!("{}/2024/alpha", base),
            format!("{}/2024/beta", base),
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts-2.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(url_set(&[
            format!("{}/2024/gamma", base),
            format!("{}/2024/gone", base),
            // Also listed in the first leaf
            format!("{}/2024/alpha", base),
        ])))
        .mount(server)
        .await;

    for (slug, id) in [("alpha", 101), ("beta", 102), ("gamma", 103)] {
        Mock::given(method("GET"))
            .and(path(format!("/2024/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_page(slug, id))
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .expect(harvests)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/2024/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    format!("{}/sitemap_index.xml", base)
}

fn http_pipeline() -> Pipeline {
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::from_config(&Default::default()).expect("Failed to build HTTP client"),
    );
    let resolver = Resolver::with_policy(Arc::clone(&fetcher), fast_policy(), 4);
    let extractor = Arc::new(HtmlMetaExtractor::new(fetcher, fast_policy()));
    Pipeline::new(resolver, extractor, 4)
}

#[tokio::test]
async fn test_harvest_to_json_lines() {
    let server = MockServer::start().await;
    let root = mount_site(&server, 1).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let out = dir.path().join("articles.jsonl");

    let mut sink = JsonLinesSink::create(&out).expect("Failed to create output");
    let report = http_pipeline()
        .run(&root, &mut sink)
        .await
        .expect("Harvest should succeed");
    drop(sink);

    assert_eq!(report.discovered, 4);
    assert_eq!(report.extracted, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.resolve.duplicates_dropped, 1);
    assert!(!report.cancelled);
    assert!((report.failure_ratio() - 0.25).abs() < f64::EPSILON);

    let contents = std::fs::read_to_string(&out).expect("Output should exist");
    let records: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("Each line is JSON"))
        .collect();
    assert_eq!(records.len(), 4);

    let alpha = records
        .iter()
        .find(|r| r["url"].as_str().is_some_and(|u| u.ends_with("/2024/alpha")))
        .expect("alpha was harvested");
    assert_eq!(alpha["status"], "complete");
    assert_eq!(alpha["title"], "alpha");
    assert_eq!(alpha["author"], "Jane Reporter");
    assert_eq!(alpha["post_id"], 101);
    assert_eq!(alpha["keywords"], serde_json::json!(["rust", "sitemaps"]));
    assert_eq!(alpha["categories"], serde_json::json!(["Technology"]));
    assert_eq!(alpha["tags"], serde_json::json!(["crawling"]));
    assert_eq!(alpha["publication_date"], "2024-03-01T09:30:00+01:00");
    assert!(alpha["last_updated_date"].is_null());
    assert!(alpha["error"].is_null());
    assert_eq!(
        alpha["full_text"],
        "First paragraph about alpha.\n\nSecond paragraph."
    );

    let gone = records
        .iter()
        .find(|r| r["url"].as_str().is_some_and(|u| u.ends_with("/2024/gone")))
        .expect("gone was reported");
    assert_eq!(gone["status"], "failed");
    assert!(gone["title"].is_null());
    assert_eq!(gone["tags"], serde_json::json!([]));
    assert!(gone["error"].as_str().is_some_and(|e| e.contains("404")));
}

#[tokio::test]
async fn test_harvest_into_sqlite_is_idempotent() {
    let server = MockServer::start().await;
    let root = mount_site(&server, 2).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("articles.db");
    let mut store = SqliteStore::new(&db_path).expect("Failed to open database");

    let run_id = store
        .create_run(&root, Some("abc123"))
        .expect("Failed to create run");
    let report = http_pipeline()
        .run(&root, &mut store)
        .await
        .expect("Harvest should succeed");
    store.finish_run(run_id, &report).expect("Failed to finish run");

    assert_eq!(store.count_articles().unwrap(), 4);
    assert_eq!(store.count_by_status(ArticleStatus::Complete).unwrap(), 3);
    assert_eq!(store.count_by_status(ArticleStatus::Failed).unwrap(), 1);

    let run = store.get_run(run_id).unwrap();
    assert_eq!(run.discovered, 4);
    assert_eq!(run.extracted, 3);
    assert_eq!(run.config_hash.as_deref(), Some("abc123"));

    let beta_url = format!("{}/2024/beta", server.uri());
    let beta = store
        .get_article(&beta_url)
        .unwrap()
        .expect("beta should be stored");
    assert_eq!(beta.content().title.as_deref(), Some("beta"));
    assert_eq!(beta.content().post_id, Some(102));

    let second = http_pipeline()
        .run(&root, &mut store)
        .await
        .expect("Second harvest should succeed");
    assert_eq!(second.extracted, 3);

    // Rows are keyed by URL, so the rerun replaces instead of duplicating.
    assert_eq!(store.count_articles().unwrap(), 4);
    let failed = store.failed_articles().unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].0.ends_with("/2024/gone"));
    assert!(failed[0].1.contains("HTTP 404"));
}
