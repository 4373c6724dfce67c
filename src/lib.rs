//! Fable Crawler: a polite fable page collector
//!
//! This crate discovers story pages from a table-of-contents page, then fetches,
//! parses and stores them one at a time, pausing between requests so the source
//! server is never hammered.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

pub use crawler::TransportError;
pub use storage::StorageError;

/// Main error type for Fable Crawler operations
#[derive(Debug, Error)]
pub enum FableError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No story links discovered at {url}")]
    NoLinksDiscovered { url: String },

    #[error("Crawl aborted at item {position} ({link}) after storing {stored} pages: {source}")]
    Aborted {
        position: usize,
        link: String,
        stored: usize,
        #[source]
        source: Box<FableError>,
    },
}

impl FableError {
    /// Number of pages persisted before the crawl stopped, if this error aborted a crawl
    pub fn stored_before_abort(&self) -> Option<usize> {
        match self {
            Self::Aborted { stored, .. } => Some(*stored),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for Fable Crawler operations
pub type Result<T> = std::result::Result<T, FableError>;

// Re-export commonly used types
pub use config::Config;
pub use state::ItemStage;
pub use storage::PageRecord;
