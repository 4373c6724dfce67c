//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Appending page documents to a named collection
//! - Run tracking for progress reporting

mod schema;
mod sqlite;
mod traits;

pub use schema::{INDEX_SUFFIX, RUNS_TABLE};
pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) a store bound to `collection` in the database at `path`
pub fn open_storage(path: &Path, collection: &str) -> StorageResult<SqliteStore> {
    SqliteStore::new(path, collection)
}

/// The document persisted for every crawled story page
///
/// `story` and `quote` are always present, even when the page had no
/// paragraphs or block quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The story link the page was fetched from
    pub link: String,

    /// Raw page bytes exactly as returned by the server
    pub html: Vec<u8>,

    /// Text of each paragraph, in document order
    pub story: Vec<String>,

    /// Text of each block quote, in document order
    pub quote: Vec<String>,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub spider: String,
    pub collection: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub links_discovered: u64,
    pub pages_stored: u64,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Interrupted,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }
}
