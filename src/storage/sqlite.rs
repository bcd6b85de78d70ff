//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ArticleStore trait.

use crate::article::{Article, ArticleContent, ArticleStatus};
use crate::output::{ArticleSink, RunReport, SinkResult};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite article store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Raw column values of one `articles` row
struct ArticleRow {
    url: String,
    post_id: Option<i64>,
    title: Option<String>,
    author: Option<String>,
    summary: Option<String>,
    full_text: Option<String>,
    keywords: String,
    categories: String,
    tags: String,
    thumbnail: Option<String>,
    publication_date: Option<String>,
    last_updated_date: Option<String>,
    status: String,
    error: Option<String>,
}

impl ArticleRow {
    fn into_article(self) -> StorageResult<Article> {
        let status = ArticleStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::Serialization(format!("unknown article status '{}'", self.status))
        })?;

        let content = ArticleContent {
            post_id: self.post_id,
            title: self.title,
            author: self.author,
            summary: self.summary,
            full_text: self.full_text,
            keywords: decode_list(&self.keywords)?,
            categories: decode_list(&self.categories)?,
            tags: decode_list(&self.tags)?,
            thumbnail: self.thumbnail,
            publication_date: decode_timestamp(self.publication_date)?,
            last_updated_date: decode_timestamp(self.last_updated_date)?,
        };

        Ok(Article::from_parts(self.url, status, content, self.error)?)
    }
}

fn encode_list(values: &[String]) -> StorageResult<String> {
    serde_json::to_string(values).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_list(raw: &str) -> StorageResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_timestamp(raw: Option<String>) -> StorageResult<Option<DateTime<FixedOffset>>> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(&value)
            .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", value, e)))
    })
    .transpose()
}

impl ArticleStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, root_url: &str, config_hash: Option<&str>) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (root_url, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![root_url, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, report: &RunReport) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let status = if report.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, discovered = ?3, extracted = ?4,
                failed = ?5, skipped_sitemaps = ?6
             WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                report.discovered as i64,
                report.extracted as i64,
                report.failed as i64,
                report.resolve.skipped.len() as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(
            "SELECT id, root_url, started_at, finished_at, config_hash, status,
                    discovered, extracted, failed, skipped_sitemaps
             FROM runs WHERE id = ?1",
        )?;

        let run = stmt
            .query_row(params![run_id], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    root_url: row.get(1)?,
                    started_at: row.get(2)?,
                    finished_at: row.get(3)?,
                    config_hash: row.get(4)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
                        .unwrap_or(RunStatus::Running),
                    discovered: row.get::<_, i64>(6)? as u64,
                    extracted: row.get::<_, i64>(7)? as u64,
                    failed: row.get::<_, i64>(8)? as u64,
                    skipped_sitemaps: row.get::<_, i64>(9)? as u64,
                })
            })
            .optional()?;

        run.ok_or(StorageError::RunNotFound(run_id))
    }

    // ===== Articles =====

    fn save_article(&mut self, article: &Article) -> StorageResult<()> {
        let content = article.content();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO articles (
                url, post_id, title, author, summary, full_text,
                keywords, categories, tags, thumbnail,
                publication_date, last_updated_date, status, error, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                article.url(),
                content.post_id,
                content.title,
                content.author,
                content.summary,
                content.full_text,
                encode_list(&content.keywords)?,
                encode_list(&content.categories)?,
                encode_list(&content.tags)?,
                content.thumbnail,
                content.publication_date.map(|d| d.to_rfc3339()),
                content.last_updated_date.map(|d| d.to_rfc3339()),
                article.status().to_db_string(),
                article.error(),
                now
            ],
        )?;
        Ok(())
    }

    fn get_article(&self, url: &str) -> StorageResult<Option<Article>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, post_id, title, author, summary, full_text,
                    keywords, categories, tags, thumbnail,
                    publication_date, last_updated_date, status, error
             FROM articles WHERE url = ?1",
        )?;

        let row = stmt
            .query_row(params![url], |row| {
                Ok(ArticleRow {
                    url: row.get(0)?,
                    post_id: row.get(1)?,
                    title: row.get(2)?,
                    author: row.get(3)?,
                    summary: row.get(4)?,
                    full_text: row.get(5)?,
                    keywords: row.get(6)?,
                    categories: row.get(7)?,
                    tags: row.get(8)?,
                    thumbnail: row.get(9)?,
                    publication_date: row.get(10)?,
                    last_updated_date: row.get(11)?,
                    status: row.get(12)?,
                    error: row.get(13)?,
                })
            })
            .optional()?;

        row.map(ArticleRow::into_article).transpose()
    }

    fn count_articles(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_status(&self, status: ArticleStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn failed_articles(&self) -> StorageResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, COALESCE(error, '') FROM articles WHERE status = ?1 ORDER BY url",
        )?;

        let rows: Vec<(String, String)> = stmt
            .query_map(params![ArticleStatus::Failed.to_db_string()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl ArticleSink for SqliteStore {
    fn accept(&mut self, article: Article) -> SinkResult<()> {
        self.save_article(&article)?;
        Ok(())
    }
}
