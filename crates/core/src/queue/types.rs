//! Queue types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One release waiting to be acquired.
///
/// Identity is the queue key `artist_id|release_folder_name`; the remaining
/// fields are display/lookup hints carried along for the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadQueueItem {
    pub artist_id: String,
    pub release_folder_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group_id: Option<String>,
}

impl DownloadQueueItem {
    /// Deduplication key: at most one queue entry or active slot per key.
    pub fn queue_key(&self) -> String {
        format!("{}|{}", self.artist_id, self.release_folder_name)
    }
}

/// Result of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Item appended to the pending queue.
    Added,
    /// Same key already waiting; queue untouched.
    AlreadyQueued,
    /// Same key currently owned by a worker slot; queue untouched.
    AlreadyActive,
}

/// Point-in-time view of one worker slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot: usize,
    pub busy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<DownloadQueueItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Last time the slot picked up or finished an item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of the whole queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending: Vec<DownloadQueueItem>,
    pub slots: Vec<SlotSnapshot>,
}
