use serde::Deserialize;
use std::time::Duration;

/// Default location of the Aesop fables collection
pub const DEFAULT_BASE_URL: &str = "http://read.gov/aesop/";

/// Default table-of-contents page, relative to the base URL
pub const DEFAULT_INDEX_PAGE: &str = "001.html";

/// Default selector for story anchors on the table-of-contents page
pub const DEFAULT_TOC_SELECTOR: &str = "ul.toc > li > a";

/// Main configuration structure for Fable Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub database: DatabaseConfig,
}

/// Where the table of contents lives and how its story links are found
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Root under which the index and story pages are published
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Table-of-contents page, relative to `base_url`
    #[serde(rename = "index-page", default = "default_index_page")]
    pub index_page: String,

    /// CSS selector matching story anchors inside the table of contents
    #[serde(rename = "toc-selector", default = "default_toc_selector")]
    pub toc_selector: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_page: default_index_page(),
            toc_selector: default_toc_selector(),
        }
    }
}

impl SourceConfig {
    /// Absolute location of the table-of-contents page
    pub fn index_url(&self) -> String {
        format!("{}{}", self.base_url, self.index_page)
    }
}

/// Delays between page requests
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Wait after every page (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Number of pages between the longer batch pauses
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Extra wait after each full batch (milliseconds)
    #[serde(rename = "batch-delay-ms", default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl PacingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Collection (table) the crawled pages are written to
    pub collection: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_index_page() -> String {
    DEFAULT_INDEX_PAGE.to_string()
}

fn default_toc_selector() -> String {
    DEFAULT_TOC_SELECTOR.to_string()
}

fn default_delay_ms() -> u64 {
    3_000
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    10_000
}
