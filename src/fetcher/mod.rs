//! HTTP fetching for sitemap documents and article pages
//!
//! This module defines the fetcher collaborator the resolver and extractors
//! talk to, including:
//! - The `Fetcher` trait and its reqwest-backed implementation
//! - Classification of responses into transient and fatal failures
//! - Retry with capped exponential backoff and jitter

mod http;
mod memory;
mod retry;

pub use http::{build_http_client, HttpFetcher};
pub use memory::MemoryFetcher;
pub use retry::{fetch_with_retry, RetryPolicy};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A raw HTTP response: status code plus body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Errors produced while fetching a URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Worth retrying: 5xx, 408, 429, timeouts, connection failures
    #[error("transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },

    /// Not worth retrying: other 4xx, 3xx, unusable URLs
    #[error("fatal failure fetching {url}: {reason}")]
    Fatal { url: String, reason: String },

    /// The shutdown signal fired before the fetch completed
    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The URL the failed fetch was for
    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Fatal { url, .. } | Self::Cancelled { url } => {
                url
            }
        }
    }
}

/// HTTP client collaborator
///
/// Implementations perform exactly one request per call and report the raw
/// status; classifying the status is left to [`classify_status`] so fakes in
/// tests behave like the real client.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// Turns a response into its body or a classified error
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | body |
/// | 3xx | Fatal (redirects are not followed) |
/// | 408, 429 | Transient |
/// | other 4xx | Fatal |
/// | 5xx | Transient |
pub fn classify_status(url: &Url, response: FetchResponse) -> Result<Vec<u8>, FetchError> {
    let status = response.status;
    let reason = || format!("HTTP {}", status);

    match status {
        200..=299 => Ok(response.body),
        408 | 429 => Err(FetchError::Transient {
            url: url.to_string(),
            reason: reason(),
        }),
        500..=599 => Err(FetchError::Transient {
            url: url.to_string(),
            reason: reason(),
        }),
        300..=399 => Err(FetchError::Fatal {
            url: url.to_string(),
            reason: format!("HTTP {} (redirects are not followed)", status),
        }),
        _ => Err(FetchError::Fatal {
            url: url.to_string(),
            reason: reason(),
        }),
    }
}
