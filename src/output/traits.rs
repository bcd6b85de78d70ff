//! Sink trait and errors
//!
//! A sink receives every finished [`Article`] of a run, in whatever order the
//! extraction pool completes them.

use crate::article::Article;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while writing articles
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize article: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for finished articles
pub trait ArticleSink {
    /// Accepts one complete or failed article
    fn accept(&mut self, article: Article) -> SinkResult<()>;

    /// Flushes buffered output once the run is over
    fn finish(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

/// Collects articles in memory
impl ArticleSink for Vec<Article> {
    fn accept(&mut self, article: Article) -> SinkResult<()> {
        self.push(article);
        Ok(())
    }
}
