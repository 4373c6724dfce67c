//! Fetch-parse-store pipeline
//!
//! Story links are processed strictly one after another. For each link the
//! pipeline:
//! - fetches the raw page
//! - extracts story paragraphs and quotes
//! - inserts the resulting document into the collection
//! - waits according to the pacing schedule
//!
//! The first fetch or insert failure aborts the whole crawl. Documents stored
//! before the failure stay in the collection.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::pacer::{Pacer, PacingSchedule};
use crate::crawler::parser::parse_page;
use crate::state::ItemStage;
use crate::storage::DocumentStore;
use crate::FableError;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}";

/// Progress bar styled for a crawl; its length is set when the crawl starts
pub fn crawl_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    match ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        Ok(style) => bar.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Using default progress style: {}", e),
    }
    bar
}

/// Outcome of a pipeline run that was not aborted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Number of links handed to the pipeline
    pub links: usize,

    /// Number of documents inserted
    pub stored: usize,

    /// True if a shutdown request stopped the crawl before the last link
    pub cancelled: bool,
}

/// Sequential crawler over a fixed list of story links
pub struct Pipeline<F, P> {
    fetcher: F,
    pacer: P,
    schedule: PacingSchedule,
    shutdown: Option<watch::Receiver<bool>>,
    progress: ProgressBar,
}

impl<F: Fetcher, P: Pacer> Pipeline<F, P> {
    pub fn new(fetcher: F, pacer: P, schedule: PacingSchedule) -> Self {
        Self {
            fetcher,
            pacer,
            schedule,
            shutdown: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Advances `progress` by one for every stored page
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Stops the crawl between items once `shutdown` reads true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Crawls `links` in order, inserting one document per link into `store`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every link was stored, or a shutdown was requested
    /// * `Err(FableError::Aborted)` - A fetch or insert failed; carries the number
    ///   of documents stored before the failure
    pub async fn run<S: DocumentStore>(
        &mut self,
        links: &[String],
        store: &mut S,
    ) -> Result<CrawlReport, FableError> {
        let total = links.len();
        let mut report = CrawlReport {
            links: total,
            ..CrawlReport::default()
        };
        self.progress.set_length(total as u64);

        for (position, link) in links.iter().enumerate() {
            if self.shutdown_requested() {
                tracing::warn!(
                    "Shutdown requested, stopping with {} of {} pages stored",
                    report.stored,
                    total
                );
                report.cancelled = true;
                self.progress.abandon_with_message("interrupted");
                return Ok(report);
            }

            self.progress.set_message(link.clone());
            let mut stage = match self.process_item(link, store).await {
                Ok(stage) => stage,
                Err(source) => {
                    self.progress.abandon_with_message("aborted");
                    return Err(FableError::Aborted {
                        position,
                        link: link.clone(),
                        stored: report.stored,
                        source: Box::new(source),
                    });
                }
            };
            report.stored += 1;
            self.progress.inc(1);
            tracing::info!("[{}/{}] Stored {}", position + 1, total, link);

            self.pace(position).await;
            advance(&mut stage, ItemStage::Paced, link);
        }

        self.progress.finish_with_message("done");
        Ok(report)
    }

    /// Fetches, parses and stores one link, returning the stage it reached
    async fn process_item<S: DocumentStore>(
        &mut self,
        link: &str,
        store: &mut S,
    ) -> Result<ItemStage, FableError> {
        let mut stage = ItemStage::Pending;

        let html = self.fetcher.fetch(link).await?;
        advance(&mut stage, ItemStage::Fetched, link);

        let record = parse_page(&html).into_record(link, html);
        advance(&mut stage, ItemStage::Parsed, link);
        tracing::debug!(
            "Parsed {}: {} paragraphs, {} quotes",
            link,
            record.story.len(),
            record.quote.len()
        );

        store.insert_page(&record)?;
        advance(&mut stage, ItemStage::Persisted, link);

        Ok(stage)
    }

    /// Waits after the item at `position`; a shutdown request ends the wait early
    async fn pace(&mut self, position: usize) {
        let schedule = self.schedule;
        for wait in schedule.waits_after(position) {
            if self.shutdown_requested() {
                return;
            }
            tracing::debug!("Sleeping {:?}", wait);

            match self.shutdown.as_mut() {
                Some(shutdown) => {
                    tokio::select! {
                        _ = self.pacer.wait(wait) => {}
                        _ = shutdown_signalled(shutdown) => {
                            tracing::debug!("Shutdown requested, cutting the wait short");
                            return;
                        }
                    }
                }
                None => self.pacer.wait(wait).await,
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Resolves once `shutdown` reads true; never resolves if the sender is gone
async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn advance(stage: &mut ItemStage, to: ItemStage, link: &str) {
    debug_assert!(
        stage.can_transition_to(to),
        "invalid stage transition {} -> {}",
        stage,
        to
    );
    tracing::trace!("{}: {} -> {}", link, stage, to);
    *stage = to;
}
