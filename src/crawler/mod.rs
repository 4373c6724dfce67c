//! Crawler module for fable page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - Table-of-contents link discovery
//! - Story text extraction
//! - The sequential fetch-parse-store pipeline and its pacing

mod discovery;
mod fetcher;
mod pacer;
mod parser;
mod pipeline;
mod spider;

#[cfg(test)]
mod testing;

pub use discovery::LinkDiscovery;
pub use fetcher::{build_http_client, user_agent_string, Fetcher, HttpFetcher, TransportError};
pub use pacer::{Pacer, PacingSchedule, RecordingPacer, TokioPacer};
pub use parser::{compile_selector, extract_toc_links, parse_page, Document, ParsedPage};
pub use pipeline::{crawl_progress_bar, CrawlReport, Pipeline};
pub use spider::Spider;

use crate::config::{Config, SourceConfig};
use crate::storage::{open_storage, RunStatus, SqliteStore};
use crate::FableError;
use indicatif::ProgressBar;
use std::path::Path;
use tokio::sync::watch;

/// Discovers story links for `source`, treating an empty table of contents as an error
pub async fn discover_story_links<F: Fetcher>(
    source: &SourceConfig,
    fetcher: &F,
) -> crate::Result<Vec<String>> {
    let discovery = LinkDiscovery::new(source)?;
    let links = discovery.discover(fetcher).await?;

    if links.is_empty() {
        return Err(FableError::NoLinksDiscovered {
            url: discovery.index_url().to_string(),
        });
    }

    Ok(links)
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the document store bound to the configured collection
/// 2. Build the HTTP client
/// 3. Discover story links from the table of contents
/// 4. Record a new run
/// 5. Fetch, parse and store every story page
/// 6. Close the run with its final status
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `spider` - The story source being crawled
/// * `config_hash` - Hash of the configuration file, recorded on the run
/// * `shutdown` - Optional signal checked between pages and during waits
/// * `progress` - Advanced once per stored page; pass `ProgressBar::hidden()` for none
pub async fn run_crawl(
    config: &Config,
    spider: Spider,
    config_hash: &str,
    shutdown: Option<watch::Receiver<bool>>,
    progress: ProgressBar,
) -> crate::Result<CrawlReport> {
    let mut store = open_storage(Path::new(&config.database.path), &config.database.collection)?;
    let fetcher = HttpFetcher::from_config(&config.user_agent)?;

    let mut pipeline = Pipeline::new(
        fetcher,
        TokioPacer,
        PacingSchedule::from_config(&config.pacing),
    )
    .with_progress(progress);
    if let Some(shutdown) = shutdown {
        pipeline = pipeline.with_shutdown(shutdown);
    }

    crawl_into(config, spider, config_hash, &mut store, pipeline).await
}

/// Discovers links with the pipeline's fetcher, then runs it inside a run record
async fn crawl_into<F: Fetcher, P: Pacer>(
    config: &Config,
    spider: Spider,
    config_hash: &str,
    store: &mut SqliteStore,
    mut pipeline: Pipeline<F, P>,
) -> crate::Result<CrawlReport> {
    let links = discover_story_links(&config.source, pipeline.fetcher()).await?;

    let run_id = store.begin_run(spider.name(), config_hash, links.len())?;
    tracing::info!(
        "Run {}: crawling {} {} pages into '{}'",
        run_id,
        links.len(),
        spider,
        store.collection()
    );

    match pipeline.run(&links, store).await {
        Ok(report) => {
            let status = if report.cancelled {
                RunStatus::Interrupted
            } else {
                RunStatus::Completed
            };
            store.finish_run(run_id, status, report.stored, None)?;
            let run = store.get_run(run_id)?;
            tracing::info!(
                "Run {} {} at {}: {}/{} pages stored",
                run.id,
                run.status.to_db_string(),
                run.finished_at.as_deref().unwrap_or("unknown time"),
                run.pages_stored,
                run.links_discovered
            );
            Ok(report)
        }
        Err(e) => {
            let stored = e.stored_before_abort().unwrap_or(0);
            if let Err(finish_err) =
                store.finish_run(run_id, RunStatus::Failed, stored, Some(&e.to_string()))
            {
                tracing::error!("Failed to record run {} failure: {}", run_id, finish_err);
            }
            Err(e)
        }
    }
}
