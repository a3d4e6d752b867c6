//! Per-release state history and current-state tracking.
//!
//! Append-only transition log per release, plus one mutable "current" row
//! per in-flight item. Entries for a given release are appended in
//! transition order only; the queue guarantees at most one slot owns a
//! release at a time, so no same-release concurrency exists.

mod config;
mod tracker;
mod types;

pub use config::HistoryConfig;
pub use tracker::HistoryTracker;
pub use types::{CurrentDownloadState, DownloadStateTransition};
