use super::ArticleStatus;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Fields an extractor fills in for one article
///
/// Every field is optional; a page that was fetched but lacks some metadata
/// still produces content with those fields left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleContent {
    pub post_id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub full_text: Option<String>,
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    pub publication_date: Option<DateTime<FixedOffset>>,
    pub last_updated_date: Option<DateTime<FixedOffset>>,
}

impl ArticleContent {
    /// Returns true if no field was filled in
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A status, content and error combination no article can be in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArticle {
    #[error("stub article {0} carries content")]
    StubWithContent(String),

    #[error("failed article {0} carries content")]
    FailedWithContent(String),

    #[error("failed article {0} has no error annotation")]
    FailedWithoutError(String),

    #[error("{status} article {url} carries an error annotation")]
    UnexpectedError { url: String, status: ArticleStatus },
}

/// One discovered article
///
/// The URL is fixed at creation. Promotion consumes the record, so a stub
/// becomes complete or failed exactly once and a failed record never carries
/// content. Deserialized records go through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArticle")]
pub struct Article {
    url: String,
    #[serde(flatten)]
    content: ArticleContent,
    status: ArticleStatus,
    error: Option<String>,
}

impl Article {
    /// Creates a stub holding only the URL
    pub fn stub(url: &Url) -> Self {
        Self {
            url: url.to_string(),
            content: ArticleContent::default(),
            status: ArticleStatus::Stub,
            error: None,
        }
    }

    /// Rebuilds a stored record, rejecting combinations promotion cannot produce
    pub(crate) fn from_parts(
        url: String,
        status: ArticleStatus,
        content: ArticleContent,
        error: Option<String>,
    ) -> Result<Self, InvalidArticle> {
        match status {
            ArticleStatus::Failed if !content.is_empty() => {
                return Err(InvalidArticle::FailedWithContent(url))
            }
            ArticleStatus::Failed if error.is_none() => {
                return Err(InvalidArticle::FailedWithoutError(url))
            }
            ArticleStatus::Stub if !content.is_empty() => {
                return Err(InvalidArticle::StubWithContent(url))
            }
            ArticleStatus::Stub | ArticleStatus::Complete if error.is_some() => {
                return Err(InvalidArticle::UnexpectedError { url, status })
            }
            _ => {}
        }

        Ok(Self {
            url,
            content,
            status,
            error,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> ArticleStatus {
        self.status
    }

    pub fn content(&self) -> &ArticleContent {
        &self.content
    }

    /// The failure annotation; only present on failed records
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.status == ArticleStatus::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.status == ArticleStatus::Failed
    }

    /// Promotes the record to complete with freshly extracted content
    pub fn complete(self, content: ArticleContent) -> Self {
        Self {
            url: self.url,
            content,
            status: ArticleStatus::Complete,
            error: None,
        }
    }

    /// Promotes the record to failed; any content is discarded
    pub fn fail(self, reason: impl Into<String>) -> Self {
        Self {
            url: self.url,
            content: ArticleContent::default(),
            status: ArticleStatus::Failed,
            error: Some(reason.into()),
        }
    }

    /// Resets the record to a fresh stub for re-extraction
    pub fn into_stub(self) -> Self {
        Self {
            url: self.url,
            content: ArticleContent::default(),
            status: ArticleStatus::Stub,
            error: None,
        }
    }
}

/// Unchecked wire form of [`Article`]
#[derive(Deserialize)]
struct RawArticle {
    url: String,
    #[serde(flatten)]
    content: ArticleContent,
    status: ArticleStatus,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawArticle> for Article {
    type Error = InvalidArticle;

    fn try_from(raw: RawArticle) -> Result<Self, Self::Error> {
        Article::from_parts(raw.url, raw.status, raw.content, raw.error)
    }
}
