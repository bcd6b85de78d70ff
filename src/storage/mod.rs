//! Storage module for persisting harvested articles
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Article persistence keyed by URL
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ArticleStore, StorageError, StorageResult};

/// Represents a harvesting run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub root_url: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: Option<String>,
    pub status: RunStatus,
    pub discovered: u64,
    pub extracted: u64,
    pub failed: u64,
    pub skipped_sitemaps: u64,
}

/// Status of a harvesting run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}
