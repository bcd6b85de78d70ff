//! Article extraction
//!
//! Extractors turn an article URL into [`ArticleContent`]. The pipeline only
//! depends on the [`Extractor`] trait; [`HtmlMetaExtractor`] is the default
//! implementation, reading OpenGraph and article meta tags.

mod html;

pub use html::{parse_article_html, HtmlMetaExtractor};

use crate::article::ArticleContent;
use crate::fetcher::FetchError;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors an extractor reports for a single article
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The page was fetched but could not be interpreted
    #[error("failed to parse {url}: {message}")]
    Parse { url: String, message: String },
}

/// Turns one article URL into its content
///
/// Implementations must be idempotent and must not mutate shared state: the
/// pipeline calls them concurrently and may call them again for the same URL
/// on a later run. A page that was fetched but lacks some fields returns
/// content with those fields empty; a page that could not be fetched or
/// parsed at all returns an error.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &Url) -> Result<ArticleContent, ExtractionError>;
}
