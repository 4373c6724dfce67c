//! Database schema definitions
//!
//! The `runs` table is shared by every collection. Each collection gets its own
//! page table, created on first use.

/// Name of the run bookkeeping table
pub const RUNS_TABLE: &str = "runs";

/// Every index name ends with this, so no table name may
pub const INDEX_SUFFIX: &str = "_idx";

/// SQL schema for the tables every database carries
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    spider TEXT NOT NULL,
    collection TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    links_discovered INTEGER NOT NULL DEFAULT 0,
    pages_stored INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS runs_collection_idx ON runs(collection);
"#;

/// SQL for a page collection table
///
/// `link` is not unique: re-running a crawl appends duplicates.
/// The caller must have validated `collection` as a plain identifier.
pub fn collection_sql(collection: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{collection}" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL,
    html BLOB NOT NULL,
    story TEXT NOT NULL,
    quote TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id),
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "{collection}_link{INDEX_SUFFIX}" ON "{collection}"(link);
"#
    )
}

/// Initializes the shared schema and the table for `collection`
pub fn initialize_schema(
    conn: &rusqlite::Connection,
    collection: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&collection_sql(collection))?;
    Ok(())
}
