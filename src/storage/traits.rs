//! Storage traits and error types
//!
//! This module defines the trait interface for document store backends and
//! associated error types.

use crate::storage::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid collection name: '{0}'")]
    InvalidCollection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A collection that crawled pages are written into
///
/// The pipeline only ever appends: there is no upsert and no existence check,
/// so storing the same link twice produces two documents.
pub trait DocumentStore {
    /// Inserts one page record as a new document
    ///
    /// # Returns
    ///
    /// The identifier of the newly inserted document
    fn insert_page(&mut self, record: &PageRecord) -> StorageResult<i64>;
}
