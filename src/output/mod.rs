//! Output module for reporting on stored crawl data

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
