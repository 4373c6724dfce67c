//! Request pacing
//!
//! Every page is followed by a fixed delay, and every full batch of pages by an
//! additional, longer one. The actual waiting is delegated to a `Pacer` so the
//! schedule can be exercised without sleeping.

use crate::config::PacingConfig;
use std::future::Future;
use std::time::Duration;

/// Waits between requests
pub trait Pacer {
    fn wait(&mut self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Pacer that sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn wait(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Pacer that records the waits it was asked for and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    waits: Vec<Duration>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Sum of all requested waits
    pub fn total(&self) -> Duration {
        self.waits.iter().sum()
    }
}

impl Pacer for RecordingPacer {
    async fn wait(&mut self, duration: Duration) {
        self.waits.push(duration);
    }
}

/// When and how long to wait after each page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingSchedule {
    delay: Duration,
    batch_size: usize,
    batch_delay: Duration,
}

impl Default for PacingSchedule {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

impl PacingSchedule {
    /// A batch size of zero is treated as one
    pub fn new(delay: Duration, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            delay,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(config.delay(), config.batch_size, config.batch_delay())
    }

    /// True if the item at zero-based `position` closes a batch
    pub fn ends_batch(&self, position: usize) -> bool {
        position % self.batch_size == self.batch_size - 1
    }

    /// Waits owed after the item at zero-based `position`, in order
    ///
    /// The batch delay comes on top of the regular delay, never instead of it.
    pub fn waits_after(&self, position: usize) -> impl Iterator<Item = Duration> {
        std::iter::once(self.delay).chain(self.ends_batch(position).then_some(self.batch_delay))
    }

    /// Total time spent waiting over a crawl of `items` pages
    pub fn total_for(&self, items: usize) -> Duration {
        (0..items).flat_map(|position| self.waits_after(position)).sum()
    }
}
