//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.
//! A store is bound to one collection for its whole lifetime.

use crate::config::is_valid_collection_name;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, spider, collection, config_hash, started_at, finished_at, status,
     links_discovered, pages_stored, error_message";

/// SQLite document store bound to a single collection
pub struct SqliteStore {
    conn: Connection,
    collection: String,
    run_id: Option<i64>,
}

impl SqliteStore {
    /// Opens or creates the database at `path` and binds it to `collection`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Invalid collection name or failed to open database
    pub fn new(path: &Path, collection: &str) -> StorageResult<Self> {
        Self::check_collection(collection)?;
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn, collection)?;

        Ok(Self {
            conn,
            collection: collection.to_string(),
            run_id: None,
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(collection: &str) -> StorageResult<Self> {
        Self::check_collection(collection)?;
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn, collection)?;
        Ok(Self {
            conn,
            collection: collection.to_string(),
            run_id: None,
        })
    }

    fn check_collection(collection: &str) -> StorageResult<()> {
        if is_valid_collection_name(collection) {
            Ok(())
        } else {
            Err(StorageError::InvalidCollection(collection.to_string()))
        }
    }

    /// The collection this store writes to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    // ===== Run Management =====

    /// Opens a run record; pages inserted until `finish_run` are tagged with it
    pub fn begin_run(
        &mut self,
        spider: &str,
        config_hash: &str,
        links_discovered: usize,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (spider, collection, config_hash, started_at, status, links_discovered)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                spider,
                self.collection,
                config_hash,
                now,
                RunStatus::Running.to_db_string(),
                links_discovered as i64
            ],
        )?;
        let run_id = self.conn.last_insert_rowid();
        self.run_id = Some(run_id);
        Ok(run_id)
    }

    /// Closes a run record with its final status and stored page count
    pub fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_stored: usize,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_stored = ?3, error_message = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                pages_stored as i64,
                error_message,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        if self.run_id == Some(run_id) {
            self.run_id = None;
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1");
        self.conn
            .query_row(&sql, params![run_id], row_to_run)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Most recent runs against this collection, newest first
    pub fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE collection = ?1 ORDER BY id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![self.collection, limit as i64], row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Page Queries =====

    /// Counts all documents in the collection
    pub fn count_pages(&self) -> StorageResult<u64> {
        self.count_where("1 = 1")
    }

    /// Counts distinct links in the collection
    pub fn count_distinct_links(&self) -> StorageResult<u64> {
        let sql = format!("SELECT COUNT(DISTINCT link) FROM \"{}\"", self.collection);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Counts documents that have at least one block quote
    pub fn count_pages_with_quotes(&self) -> StorageResult<u64> {
        self.count_where("quote <> '[]'")
    }

    /// Counts documents without any story paragraphs
    pub fn count_pages_without_story(&self) -> StorageResult<u64> {
        self.count_where("story = '[]'")
    }

    fn count_where(&self, predicate: &str) -> StorageResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\" WHERE {}",
            self.collection, predicate
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All documents stored for `link`, oldest first
    pub fn get_pages_by_link(&self, link: &str) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT link, html, story, quote FROM \"{}\" WHERE link = ?1 ORDER BY id",
            self.collection
        );
        self.query_pages(&sql, params![link])
    }

    /// All documents in insertion order
    pub fn all_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT link, html, story, quote FROM \"{}\" ORDER BY id",
            self.collection
        );
        self.query_pages(&sql, [])
    }

    fn query_pages<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(link, html, story, quote)| -> StorageResult<PageRecord> {
                Ok(PageRecord {
                    link,
                    html,
                    story: serde_json::from_str(&story)?,
                    quote: serde_json::from_str(&quote)?,
                })
            })
            .collect()
    }
}

impl DocumentStore for SqliteStore {
    fn insert_page(&mut self, record: &PageRecord) -> StorageResult<i64> {
        let story = serde_json::to_string(&record.story)?;
        let quote = serde_json::to_string(&record.quote)?;
        let now = Utc::now().to_rfc3339();

        let sql = format!(
            "INSERT INTO \"{}\" (link, html, story, quote, run_id, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            self.collection
        );
        self.conn.execute(
            &sql,
            params![
                record.link,
                record.html.as_slice(),
                story,
                quote,
                self.run_id,
                now
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        spider: row.get(1)?,
        collection: row.get(2)?,
        config_hash: row.get(3)?,
        started_at: row.get(4)?,
        finished_at: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Failed),
        links_discovered: row.get::<_, i64>(7)? as u64,
        pages_stored: row.get::<_, i64>(8)? as u64,
        error_message: row.get(9)?,
    })
}
