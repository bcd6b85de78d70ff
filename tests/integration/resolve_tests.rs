//! End-to-end sitemap resolution over HTTP

use crate::{fast_policy, sitemap_index, url_set};
use sitemap_harvester::fetcher::{FetchError, HttpFetcher, RetryPolicy};
use sitemap_harvester::resolver::BranchError;
use sitemap_harvester::{HarvestError, Resolver};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver(policy: RetryPolicy) -> Resolver {
    let fetcher = Arc::new(
        HttpFetcher::from_config(&Default::default()).expect("Failed to build HTTP client"),
    );
    Resolver::with_policy(fetcher, policy, 4)
}

async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

fn articles(base: &str, prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{}/{}/{}", base, prefix, i))
        .collect()
}

#[tokio::test]
async fn test_failing_child_is_skipped_after_retries() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children = vec![
        format!("{}/sitemap-a.xml", base),
        format!("{}/sitemap-b.xml", base),
        format!("{}/sitemap-c.xml", base),
    ];
    serve(&server, "/sitemap_index.xml", 200, sitemap_index(&children)).await;
    serve(&server, "/sitemap-a.xml", 200, url_set(&articles(&base, "a", 3))).await;
    serve(&server, "/sitemap-c.xml", 200, url_set(&articles(&base, "c", 2))).await;

    Mock::given(method("GET"))
        .and(path("/sitemap-b.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let (urls, report) = resolver(fast_policy())
        .resolve_all(&format!("{}/sitemap_index.xml", base))
        .await
        .expect("Root should resolve");

    let found: HashSet<String> = urls.iter().map(|u| u.to_string()).collect();
    let expected: HashSet<String> = articles(&base, "a", 3)
        .into_iter()
        .chain(articles(&base, "c", 2))
        .collect();
    assert_eq!(found, expected);

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].url, children[1]);
    assert_eq!(report.skipped[0].depth, 1);
    assert!(matches!(report.skipped[0].reason, BranchError::Fetch(ref e) if e.is_transient()));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_root_not_found_fails_resolution() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = resolver(fast_policy())
        .resolve_all(&format!("{}/sitemap_index.xml", server.uri()))
        .await;

    assert!(matches!(result, Err(HarvestError::RootFetch { .. })));
}

#[tokio::test]
async fn test_redirected_root_is_not_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/old-sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/sitemap.xml", base).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(url_set(&articles(&base, "a", 1))),
        )
        .expect(0)
        .mount(&server)
        .await;

    let result = resolver(fast_policy())
        .resolve_all(&format!("{}/old-sitemap.xml", base))
        .await;

    match result {
        Err(HarvestError::RootFetch {
            source: FetchError::Fatal { reason, .. },
            ..
        }) => assert!(reason.contains("redirects are not followed")),
        other => panic!("expected a fatal root fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_root_fails_resolution() {
    let server = MockServer::start().await;
    serve(&server, "/sitemap.xml", 200, "<urlset><url>".to_string()).await;

    let result = resolver(fast_policy())
        .resolve_all(&format!("{}/sitemap.xml", server.uri()))
        .await;

    assert!(matches!(result, Err(HarvestError::RootDecode { .. })));
}

#[tokio::test]
async fn test_nested_indexes_and_duplicates() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/root.xml",
        200,
        sitemap_index(&[
            format!("{}/2023.xml", base),
            format!("{}/2024.xml", base),
        ]),
    )
    .await;
    serve(
        &server,
        "/2023.xml",
        200,
        sitemap_index(&[format!("{}/2023-12.xml", base)]),
    )
    .await;
    serve(
        &server,
        "/2024.xml",
        200,
        sitemap_index(&[
            format!("{}/2024-01.xml", base),
            // Listed twice across the tree; fetched once
            format!("{}/2023-12.xml", base),
        ]),
    )
    .await;

    let december = articles(&base, "news", 4);
    let mut january = articles(&base, "news", 2);
    january.push(format!("{}/news/new-year", base));

    serve(&server, "/2023-12.xml", 200, url_set(&december)).await;
    serve(&server, "/2024-01.xml", 200, url_set(&january)).await;

    let (urls, report) = resolver(fast_policy())
        .resolve_all(&format!("{}/root.xml", base))
        .await
        .expect("Root should resolve");

    assert_eq!(urls.len(), 5);
    let unique: HashSet<&url::Url> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len());

    assert_eq!(report.sitemaps_visited, 5);
    assert_eq!(report.duplicates_dropped, 2);
    assert!(report.is_complete());

    let requests = server.received_requests().await.expect("Recording enabled");
    let december_fetches = requests
        .iter()
        .filter(|r| r.url.path() == "/2023-12.xml")
        .count();
    assert_eq!(december_fetches, 1);
}

#[tokio::test]
async fn test_slow_child_times_out() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/index.xml",
        200,
        sitemap_index(&[format!("{}/fast.xml", base), format!("{}/slow.xml", base)]),
    )
    .await;
    serve(&server, "/fast.xml", 200, url_set(&articles(&base, "fast", 2))).await;

    Mock::given(method("GET"))
        .and(path("/slow.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(url_set(&articles(&base, "slow", 2)))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 1,
        request_timeout: Duration::from_millis(200),
        ..fast_policy()
    };

    let (urls, report) = resolver(policy)
        .resolve_all(&format!("{}/index.xml", base))
        .await
        .expect("Root should resolve");

    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.path().starts_with("/fast/")));
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].url.ends_with("/slow.xml"));
}

#[tokio::test]
async fn test_entities_and_bad_entries_in_leaf() {
    let server = MockServer::start().await;
    let base = server.uri();

    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>
    {base}/search?q=rust&amp;page=2
  </loc></url>
  <url><loc><![CDATA[{base}/cdata-article]]></loc></url>
  <url><loc>/relative/path</loc></url>
  <url><loc>mailto:editor@example.com</loc></url>
</urlset>"#,
        base = base
    );
    serve(&server, "/sitemap.xml", 200, body).await;

    let (urls, report) = resolver(fast_policy())
        .resolve_all(&format!("{}/sitemap.xml", base))
        .await
        .expect("Root should resolve");

    let found: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    assert_eq!(
        found,
        vec![
            format!("{}/search?q=rust&page=2", base),
            format!("{}/cdata-article", base),
        ]
    );
    assert_eq!(report.malformed_entries, 2);
}
