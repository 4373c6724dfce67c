//! In-memory collaborators for crawler unit tests

use crate::crawler::fetcher::{Fetcher, TransportError};
use crate::storage::{DocumentStore, PageRecord, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

enum Canned {
    Page(Vec<u8>),
    Status(u16),
}

/// Fetcher serving canned responses; unknown URLs answer 404
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Page(body.into()));
        self
    }

    pub fn failure(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Status(status));
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Canned::Page(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Store keeping inserted records in a Vec, optionally failing on the n-th insert
#[derive(Default)]
pub struct MemoryStore {
    pub records: Vec<PageRecord>,
    fail_on_insert: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the insert at zero-based `index` (counting attempts)
    pub fn failing_at(index: usize) -> Self {
        Self {
            records: Vec::new(),
            fail_on_insert: Some(index),
        }
    }

    pub fn links(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.link.as_str()).collect()
    }
}

impl DocumentStore for MemoryStore {
    fn insert_page(&mut self, record: &PageRecord) -> StorageResult<i64> {
        if self.fail_on_insert == Some(self.records.len()) {
            return Err(StorageError::Sqlite(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                Some("database is locked".to_string()),
            )));
        }
        self.records.push(record.clone());
        Ok(self.records.len() as i64)
    }
}
