use crate::UrlError;
use url::Url;

/// Parses a string into an absolute HTTP(S) URL
///
/// Surrounding whitespace is trimmed first, since `<loc>` values are often
/// pretty-printed across lines.
///
/// # Arguments
///
/// * `raw` - The URL string to parse
///
/// # Returns
///
/// * `Ok(Url)` - A well-formed absolute URL with a host
/// * `Err(UrlError)` - The string is relative, malformed, or not HTTP(S)
///
/// # Examples
///
/// ```
/// use sitemap_harvester::url::parse_absolute_url;
///
/// let url = parse_absolute_url("  https://example.com/news/1  ").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/news/1");
/// assert!(parse_absolute_url("/news/1").is_err());
/// ```
pub fn parse_absolute_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(trimmed.to_string())),
    }
}

/// Computes the deduplication key for a URL
///
/// # Normalization Steps
///
/// 1. Lowercase the scheme and host (done by the URL parser for HTTP(S))
/// 2. Drop the default port (also done by the parser)
/// 3. Remove the fragment
/// 4. Remove the trailing slash from the path (except for root /)
///
/// Path case and query strings are preserved: they are significant to most
/// origin servers.
///
/// # Examples
///
/// ```
/// use sitemap_harvester::url::{normalize_url, parse_absolute_url};
///
/// let url = parse_absolute_url("HTTPS://Example.COM/News/1/").unwrap();
/// assert_eq!(normalize_url(&url), "https://example.com/News/1");
/// ```
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let path = normalized.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        let trimmed = trimmed.to_string();
        normalized.set_path(&trimmed);
    }

    normalized.to_string()
}

/// Parses and normalizes a URL string in one step
pub fn normalize_str(raw: &str) -> Result<String, UrlError> {
    parse_absolute_url(raw).map(|url| normalize_url(&url))
}
