//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ItemStage`: Tracks how far a single story link has moved through the pipeline
//!   (pending, fetched, parsed, persisted, paced)

mod item_stage;

pub use item_stage::ItemStage;
