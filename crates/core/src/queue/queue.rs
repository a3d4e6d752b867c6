//! The pending-download FIFO.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::debug;

use crate::events::{Event, EventSink};
use crate::metrics;

use super::types::{DownloadQueueItem, EnqueueOutcome};

struct Inner {
    pending: VecDeque<DownloadQueueItem>,
    /// queue_key -> slot index currently running it.
    active: HashMap<String, usize>,
}

/// FIFO of releases waiting for a worker slot.
///
/// Enqueueing a key that is already pending or active is a no-op, so one
/// release can never occupy two slots or appear twice in the queue.
pub struct DownloadQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    sink: Arc<dyn EventSink>,
}

impl DownloadQueue {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                active: HashMap::new(),
            }),
            notify: Notify::new(),
            sink,
        }
    }

    /// Append an item unless its key is already pending or active.
    pub fn enqueue(&self, item: DownloadQueueItem) -> EnqueueOutcome {
        let key = item.queue_key();
        let pending = {
            let mut inner = self.lock();
            if inner.active.contains_key(&key) {
                debug!(queue_key = %key, "enqueue ignored, already active");
                return EnqueueOutcome::AlreadyActive;
            }
            if inner.pending.iter().any(|i| i.queue_key() == key) {
                debug!(queue_key = %key, "enqueue ignored, already queued");
                return EnqueueOutcome::AlreadyQueued;
            }
            inner.pending.push_back(item);
            inner.pending.len()
        };

        debug!(queue_key = %key, pending, "item enqueued");
        self.publish_depth(pending);
        self.notify.notify_one();
        EnqueueOutcome::Added
    }

    /// Remove a pending item. Active items cannot be removed this way; cancel
    /// them through the worker pool instead.
    pub fn try_remove(&self, queue_key: &str) -> bool {
        let removed_at = {
            let mut inner = self.lock();
            let pos = inner.pending.iter().position(|i| i.queue_key() == queue_key);
            if let Some(pos) = pos {
                inner.pending.remove(pos);
            }
            pos.map(|_| inner.pending.len())
        };
        match removed_at {
            Some(pending) => {
                debug!(queue_key, "pending item removed");
                self.publish_depth(pending);
                true
            }
            None => false,
        }
    }

    /// Push a pending item to the back of the queue. Returns false when the
    /// key is not pending.
    pub fn move_to_back(&self, queue_key: &str) -> bool {
        let moved = {
            let mut inner = self.lock();
            let pos = inner.pending.iter().position(|i| i.queue_key() == queue_key);
            match pos {
                Some(pos) => {
                    if let Some(item) = inner.pending.remove(pos) {
                        inner.pending.push_back(item);
                    }
                    Some(inner.pending.len())
                }
                None => None,
            }
        };
        match moved {
            Some(pending) => {
                self.publish_depth(pending);
                true
            }
            None => false,
        }
    }

    /// Pending items in dequeue order.
    pub fn pending(&self) -> Vec<DownloadQueueItem> {
        self.lock().pending.iter().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether a key is currently owned by a worker slot.
    pub fn is_active(&self, queue_key: &str) -> bool {
        self.lock().active.contains_key(queue_key)
    }

    /// Wait for the next item and claim it for `slot`. Used by the worker
    /// pool only.
    pub(crate) async fn next_item(&self, slot: usize) -> DownloadQueueItem {
        loop {
            let claimed = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(item) => {
                        inner.active.insert(item.queue_key(), slot);
                        Some((item, inner.pending.len()))
                    }
                    None => None,
                }
            };
            if let Some((item, pending)) = claimed {
                // Notify stores at most one permit, so back-to-back enqueues
                // can collapse while every worker is between the pop and the
                // await. Pass the wakeup on while items remain.
                if pending > 0 {
                    self.notify.notify_one();
                }
                self.publish_depth(pending);
                return item;
            }
            self.notify.notified().await;
        }
    }

    /// Release a slot's claim on a key once its run finishes.
    pub(crate) fn release(&self, queue_key: &str) {
        self.lock().active.remove(queue_key);
    }

    fn publish_depth(&self, pending: usize) {
        metrics::QUEUE_PENDING.set(pending as i64);
        self.sink.publish(Event::QueueChanged { pending });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
