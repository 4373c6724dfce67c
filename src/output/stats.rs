//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! statistics about a collection and the runs that filled it.

use crate::storage::{RunRecord, SqliteStore};
use crate::FableError;

/// How many recent runs are included in the statistics
const RECENT_RUN_LIMIT: usize = 5;

/// Collection statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Name of the collection
    pub collection: String,

    /// Total number of stored documents
    pub total_pages: u64,

    /// Number of distinct story links
    pub distinct_links: u64,

    /// Documents with at least one block quote
    pub pages_with_quotes: u64,

    /// Documents where no paragraph was found
    pub pages_without_story: u64,

    /// Most recent runs against the collection, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl CrawlStatistics {
    /// Documents stored more than once for the same link
    pub fn duplicate_pages(&self) -> u64 {
        self.total_pages.saturating_sub(self.distinct_links)
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &SqliteStore) -> Result<CrawlStatistics, FableError> {
    Ok(CrawlStatistics {
        collection: storage.collection().to_string(),
        total_pages: storage.count_pages()?,
        distinct_links: storage.count_distinct_links()?,
        pages_with_quotes: storage.count_pages_with_quotes()?,
        pages_without_story: storage.count_pages_without_story()?,
        recent_runs: storage.recent_runs(RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Collection '{}' ===\n", stats.collection);

    println!("Overview:");
    println!("  Stored pages: {}", stats.total_pages);
    println!("  Distinct links: {}", stats.distinct_links);
    println!("  Duplicate pages: {}", stats.duplicate_pages());
    println!("  Pages with quotes: {}", stats.pages_with_quotes);
    println!("  Pages without story text: {}", stats.pages_without_story);
    println!();

    if stats.recent_runs.is_empty() {
        println!("No runs recorded.");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} {} [{}] started {}, {} / {} pages stored",
            run.id,
            run.spider,
            run.status.to_db_string(),
            run.started_at,
            run.pages_stored,
            run.links_discovered
        );
        if let Some(message) = &run.error_message {
            println!("      error: {}", message);
        }
    }
}
