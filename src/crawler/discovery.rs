//! Link discovery from the table-of-contents page

use crate::config::SourceConfig;
use crate::crawler::fetcher::{Fetcher, TransportError};
use crate::crawler::parser::{compile_selector, extract_toc_links, Document};
use crate::ConfigError;
use scraper::Selector;

/// Finds the story pages listed on a table-of-contents page
pub struct LinkDiscovery {
    base_url: String,
    index_url: String,
    selector: Selector,
}

impl LinkDiscovery {
    /// Prepares discovery for `source`, compiling its selector once
    pub fn new(source: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: source.base_url.clone(),
            index_url: source.index_url(),
            selector: compile_selector(&source.toc_selector)?,
        })
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Fetches the index page and returns the story links in page order
    ///
    /// An index without matching anchors yields an empty list. A failed fetch
    /// yields an error and no links at all.
    pub async fn discover<F: Fetcher>(&self, fetcher: &F) -> Result<Vec<String>, TransportError> {
        tracing::info!("Fetching table of contents from {}", self.index_url);
        let content = fetcher.fetch(&self.index_url).await?;

        let document = Document::parse(&content);
        let links = extract_toc_links(&document, &self.selector, &self.base_url);

        if links.is_empty() {
            tracing::warn!("No story links found on {}", self.index_url);
        } else {
            tracing::info!("Discovered {} story links", links.len());
        }

        Ok(links)
    }
}
