use super::{ExtractionError, Extractor};
use crate::article::ArticleContent;
use crate::fetcher::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::shutdown::Shutdown;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use scraper::{Html, Selector};
use std::sync::Arc;
use url::Url;

/// Default extractor: fetches the page and reads its metadata tags
pub struct HtmlMetaExtractor {
    fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
    shutdown: Shutdown,
}

impl HtmlMetaExtractor {
    /// Creates an extractor sharing `fetcher` with the resolver
    ///
    /// By default page fetches are never cancelled, so an extraction that has
    /// started always runs to completion.
    pub fn new(fetcher: Arc<dyn Fetcher>, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            policy,
            shutdown: Shutdown::new(),
        }
    }

    /// Aborts page fetches when `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }
}

#[async_trait]
impl Extractor for HtmlMetaExtractor {
    async fn extract(&self, url: &Url) -> Result<ArticleContent, ExtractionError> {
        let body = fetch_with_retry(self.fetcher.as_ref(), url, &self.policy, &self.shutdown).await?;

        let html = String::from_utf8_lossy(&body);
        if html.trim().is_empty() {
            return Err(ExtractionError::Parse {
                url: url.to_string(),
                message: "empty response body".to_string(),
            });
        }

        Ok(parse_article_html(&html, url))
    }
}

/// Reads article fields from an HTML page
///
/// # Field Sources
///
/// | Field | Source |
/// |-------|--------|
/// | title | `og:title`, then `<title>` |
/// | author | `author`, then `article:author` |
/// | summary | `description`, then `og:description` |
/// | full_text | `<p>` inside `<article>`, then inside `<body>` |
/// | keywords | `keywords` and `news_keywords`, comma separated |
/// | categories | every `article:section` |
/// | tags | every `article:tag` |
/// | thumbnail | `og:image`, resolved against the page URL |
/// | publication_date | `article:published_time` |
/// | last_updated_date | `article:modified_time`, then `og:updated_time` |
/// | post_id | `<link rel="shortlink" href="...?p=N">`, then a `postid-N` body class |
///
/// Missing or unparseable values leave the field empty.
///
/// # Example
///
/// ```
/// use sitemap_harvester::extract::parse_article_html;
/// use url::Url;
///
/// let html = r#"<html><head><meta property="og:title" content="Hello"></head></html>"#;
/// let base = Url::parse("https://example.com/news/hello").unwrap();
/// let content = parse_article_html(html, &base);
/// assert_eq!(content.title.as_deref(), Some("Hello"));
/// ```
pub fn parse_article_html(html: &str, base_url: &Url) -> ArticleContent {
    let document = Html::parse_document(html);

    let mut keywords = Vec::new();
    for raw in meta_contents(&document, &["meta[name='keywords']", "meta[name='news_keywords']"]) {
        for keyword in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            push_unique(&mut keywords, keyword.to_string());
        }
    }

    ArticleContent {
        post_id: extract_post_id(&document, base_url),
        title: meta_content(&document, &["meta[property='og:title']"])
            .or_else(|| extract_title(&document)),
        author: meta_content(
            &document,
            &["meta[name='author']", "meta[property='article:author']"],
        ),
        summary: meta_content(
            &document,
            &["meta[name='description']", "meta[property='og:description']"],
        ),
        full_text: extract_full_text(&document),
        keywords,
        categories: unique(meta_contents(&document, &["meta[property='article:section']"])),
        tags: unique(meta_contents(&document, &["meta[property='article:tag']"])),
        thumbnail: meta_content(&document, &["meta[property='og:image']"])
            .and_then(|src| base_url.join(&src).ok())
            .map(|url| url.to_string()),
        publication_date: meta_content(&document, &["meta[property='article:published_time']"])
            .and_then(|raw| parse_timestamp(&raw)),
        last_updated_date: meta_content(
            &document,
            &[
                "meta[property='article:modified_time']",
                "meta[property='og:updated_time']",
            ],
        )
        .and_then(|raw| parse_timestamp(&raw)),
    }
}

/// First non-empty `content` attribute matched by the selectors, in order
fn meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    meta_contents(document, selectors).into_iter().next()
}

/// Every non-empty `content` attribute matched by the selectors
fn meta_contents(document: &Html, selectors: &[&str]) -> Vec<String> {
    let mut values = Vec::new();
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(content) = element.value().attr("content") {
                let content = collapse_whitespace(content);
                if !content.is_empty() {
                    values.push(content);
                }
            }
        }
    }
    values
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_full_text(document: &Html) -> Option<String> {
    for scope in ["article p", "body p"] {
        let Ok(selector) = Selector::parse(scope) else {
            continue;
        };
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return Some(paragraphs.join("\n\n"));
        }
    }
    None
}

fn extract_post_id(document: &Html, base_url: &Url) -> Option<i64> {
    if let Ok(selector) = Selector::parse("link[rel='shortlink'][href]") {
        let from_shortlink = document
            .select(&selector)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| base_url.join(href.trim()).ok())
            .find_map(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == "p")
                    .and_then(|(_, value)| value.parse::<i64>().ok())
            });
        if from_shortlink.is_some() {
            return from_shortlink;
        }
    }

    let selector = Selector::parse("body[class]").ok()?;
    let body = document.select(&selector).next()?;
    body.value()
        .classes()
        .find_map(|class| class.strip_prefix("postid-")?.parse::<i64>().ok())
}

/// Parses an RFC 3339 timestamp, also accepting offsets without a colon
///
/// Timestamps without an offset are rejected.
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn unique(values: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        push_unique(&mut out, value);
    }
    out
}
