use super::{FetchError, FetchResponse, Fetcher};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed; a 3xx is reported back to the caller as a
/// fatal status. gzip and brotli transfer encodings are decoded by reqwest.
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use sitemap_harvester::config::UserAgentConfig;
/// use sitemap_harvester::fetcher::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "NewsHarvester".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with a fresh client identified by `config`
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        build_http_client(config).map(Self::new)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResponse, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Maps a transport error onto the retry classification
fn classify_reqwest_error(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_builder() {
        return FetchError::Fatal {
            url,
            reason: format!("invalid request: {}", error),
        };
    }

    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Transient { url, reason }
}
