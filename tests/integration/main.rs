//! Integration tests against mock HTTP servers
//!
//! Each test spins up its own wiremock server serving sitemap documents
//! and article pages.

mod pipeline_tests;
mod resolve_tests;

use sitemap_harvester::fetcher::RetryPolicy;
use std::time::Duration;

/// Builds a `<sitemapindex>` document listing `children`
pub fn sitemap_index(children: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );
    for child in children {
        xml.push_str(&format!(
            "  <sitemap>\n    <loc>{}</loc>\n    <lastmod>2024-03-01T00:00:00+00:00</lastmod>\n  </sitemap>\n",
            child
        ));
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

/// Builds a `<urlset>` document listing `articles`
pub fn url_set(articles: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );
    for article in articles {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <changefreq>daily</changefreq>\n  </url>\n",
            article
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Three quick attempts per fetch and a short request timeout
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        jitter: Duration::ZERO,
        request_timeout: Duration::from_secs(2),
    }
}
