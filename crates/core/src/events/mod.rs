//! Fire-and-forget event publication.
//!
//! The core publishes progress, queue and history events to an injected
//! [`EventSink`]. Delivery is best-effort: a sink may drop events, and a
//! failing subscriber must never block or fail the publisher. Any real
//! transport (websocket fan-out, message queue, in-process channel) can sit
//! behind the trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::queue::SlotSnapshot;
use crate::workflow::DownloadState;

/// Progress snapshot for one in-flight release acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Workflow correlation id (release id or artist|folder key).
    pub correlation_id: String,
    /// Id of this particular workflow run.
    pub run_id: Uuid,
    pub artist_name: String,
    pub release_title: String,
    pub state: DownloadState,
    /// Files completed so far in the current transfer.
    pub files_completed: u32,
    /// Total files expected, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_total: Option<u32>,
    /// Human-readable status line ("Searching providers (2/3)", ...).
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Events emitted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A workflow published a new progress snapshot.
    ProgressUpdated(ProgressSnapshot),
    /// The pending queue changed (enqueue, dequeue, removal).
    QueueChanged { pending: usize },
    /// A worker slot changed its status.
    SlotStatusChanged(SlotSnapshot),
    /// A state transition was appended to a release's history.
    HistoryUpdated { correlation_id: String },
}

/// Sink for core events. Publication must not block on subscribers.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

/// Sink that drops everything. Useful default for tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: Event) {}
}

/// Sink backed by a lossy tokio broadcast channel.
///
/// Subscribers that fall behind lose events; the publisher never waits.
pub struct BroadcastEventSink {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventSink {
    /// Create a sink with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: Event) {
        // send only fails when there are no receivers, which is fine
        if self.tx.send(event).is_err() {
            trace!("event published with no subscribers");
        }
    }
}
