//! Database schema definitions
//!
//! This module contains the SQL schema for the article store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvesting runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT,
    status TEXT NOT NULL,
    discovered INTEGER NOT NULL DEFAULT 0,
    extracted INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    skipped_sitemaps INTEGER NOT NULL DEFAULT 0
);

-- One row per article URL; lists are JSON arrays, timestamps RFC 3339 text
CREATE TABLE IF NOT EXISTS articles (
    url TEXT PRIMARY KEY,
    post_id INTEGER,
    title TEXT,
    author TEXT,
    summary TEXT,
    full_text TEXT,
    keywords TEXT NOT NULL DEFAULT '[]',
    categories TEXT NOT NULL DEFAULT '[]',
    tags TEXT NOT NULL DEFAULT '[]',
    thumbnail TEXT,
    publication_date TEXT,
    last_updated_date TEXT,
    status TEXT NOT NULL,
    error TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
"#;

/// Initializes the database schema
///
/// Safe to call on an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
