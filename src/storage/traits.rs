//! Storage traits and error types
//!
//! This module defines the trait interface for article stores and the
//! associated error types.

use crate::article::{Article, ArticleStatus, InvalidArticle};
use crate::output::RunReport;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid stored article: {0}")]
    InvalidRecord(#[from] InvalidArticle),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent article store
pub trait ArticleStore {
    // ===== Run Management =====

    /// Records the start of a run and returns its ID
    fn create_run(&mut self, root_url: &str, config_hash: Option<&str>) -> StorageResult<i64>;

    /// Records the final counts of a run
    fn finish_run(&mut self, run_id: i64, report: &RunReport) -> StorageResult<()>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    // ===== Articles =====

    /// Inserts the article, replacing any row with the same URL
    fn save_article(&mut self, article: &Article) -> StorageResult<()>;

    fn get_article(&self, url: &str) -> StorageResult<Option<Article>>;

    fn count_articles(&self) -> StorageResult<u64>;

    fn count_by_status(&self, status: ArticleStatus) -> StorageResult<u64>;

    /// URL and error annotation of every failed article
    fn failed_articles(&self) -> StorageResult<Vec<(String, String)>>;
}
