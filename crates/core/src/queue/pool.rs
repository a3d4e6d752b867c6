//! Worker pool draining the download queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{Event, EventSink};
use crate::metrics;
use crate::provider::{CancellationSource, CancellationToken};
use crate::workflow::DownloadState;

use super::config::QueueConfig;
use super::queue::DownloadQueue;
use super::types::{DownloadQueueItem, QueueStatus, SlotSnapshot};

/// What a worker slot runs for each claimed item. Implemented by the
/// acquisition workflow; swappable in tests.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Drive one item to a terminal state. Must not panic; cancellation is
    /// delivered through the token.
    async fn run(&self, item: &DownloadQueueItem, token: CancellationToken) -> DownloadState;
}

#[derive(Default)]
struct SlotState {
    item: Option<DownloadQueueItem>,
    started_at: Option<DateTime<Utc>>,
    last_activity_at: Option<DateTime<Utc>>,
    cancel: Option<CancellationSource>,
}

struct WorkerCtx {
    slot: usize,
    queue: Arc<DownloadQueue>,
    slots: Arc<Vec<Mutex<SlotState>>>,
    runner: Arc<dyn WorkflowRunner>,
    sink: Arc<dyn EventSink>,
}

/// Fixed set of workers, each owning one download slot.
///
/// Slots claim items from the queue in FIFO order and run them to a terminal
/// state. Shutdown cancels in-flight runs and waits for the workers to drain.
pub struct WorkerPool {
    queue: Arc<DownloadQueue>,
    slots: Arc<Vec<Mutex<SlotState>>>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn the workers and start draining the queue.
    pub fn start(
        config: &QueueConfig,
        queue: Arc<DownloadQueue>,
        runner: Arc<dyn WorkflowRunner>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let slot_count = config.slots.max(1);
        let (shutdown_tx, _) = broadcast::channel(1);
        let slots: Arc<Vec<Mutex<SlotState>>> = Arc::new(
            (0..slot_count)
                .map(|_| Mutex::new(SlotState::default()))
                .collect(),
        );

        let mut handles = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            let ctx = WorkerCtx {
                slot,
                queue: queue.clone(),
                slots: slots.clone(),
                runner: runner.clone(),
                sink: sink.clone(),
            };
            handles.push(tokio::spawn(worker_loop(ctx, shutdown_tx.subscribe())));
        }
        info!(slots = slot_count, "worker pool started");

        Self {
            queue,
            slots,
            shutdown_tx,
            handles: Mutex::new(handles),
        }
    }

    /// Cancel a release wherever it is: an active run gets its cancellation
    /// signal, a pending item is removed from the queue. Returns false when
    /// the key is neither active nor pending.
    pub fn cancel(&self, queue_key: &str) -> bool {
        for slot in self.slots.iter() {
            let state = lock(slot);
            let owns = state
                .item
                .as_ref()
                .is_some_and(|i| i.queue_key() == queue_key);
            if owns {
                if let Some(source) = &state.cancel {
                    info!(queue_key, "cancelling active download");
                    source.cancel();
                }
                return true;
            }
        }
        self.queue.try_remove(queue_key)
    }

    /// Cancel whatever is actively downloading for an artist. Pending items
    /// are left alone. Returns true when at least one run was signalled.
    pub fn cancel_active_for_artist(&self, artist_id: &str) -> bool {
        let mut signalled = false;
        for slot in self.slots.iter() {
            let state = lock(slot);
            let owns = state
                .item
                .as_ref()
                .is_some_and(|i| i.artist_id == artist_id);
            if owns {
                if let Some(source) = &state.cancel {
                    info!(artist_id, "cancelling active download for artist");
                    source.cancel();
                    signalled = true;
                }
            }
        }
        signalled
    }

    /// Snapshot of the queue and every slot.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            pending: self.queue.pending(),
            slots: (0..self.slots.len())
                .map(|i| snapshot_slot(&self.slots, i))
                .collect(),
        }
    }

    /// Stop accepting work, cancel in-flight runs, wait for workers to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let handles: Vec<_> = lock(&self.handles).drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        info!("worker pool stopped");
    }
}

async fn worker_loop(ctx: WorkerCtx, mut shutdown: broadcast::Receiver<()>) {
    debug!(slot = ctx.slot, "worker started");
    loop {
        let item = tokio::select! {
            _ = shutdown.recv() => break,
            item = ctx.queue.next_item(ctx.slot) => item,
        };
        let key = item.queue_key();
        let (source, token) = CancellationSource::new();
        {
            let mut state = lock(&ctx.slots[ctx.slot]);
            let now = Utc::now();
            state.item = Some(item.clone());
            state.started_at = Some(now);
            state.last_activity_at = Some(now);
            state.cancel = Some(source);
        }
        metrics::SLOTS_BUSY.inc();
        publish_slot(&ctx);
        info!(slot = ctx.slot, queue_key = %key, "slot picked up item");

        let run = ctx.runner.run(&item, token);
        tokio::pin!(run);
        let mut interrupted = false;
        let final_state = tokio::select! {
            state = &mut run => state,
            _ = shutdown.recv() => {
                interrupted = true;
                if let Some(source) = lock(&ctx.slots[ctx.slot]).cancel.take() {
                    source.cancel();
                }
                // Let the run observe the cancellation and settle
                run.await
            }
        };
        info!(slot = ctx.slot, queue_key = %key, state = %final_state, "slot finished item");

        {
            let mut state = lock(&ctx.slots[ctx.slot]);
            state.item = None;
            state.started_at = None;
            state.last_activity_at = Some(Utc::now());
            state.cancel = None;
        }
        ctx.queue.release(&key);
        metrics::SLOTS_BUSY.dec();
        publish_slot(&ctx);

        if interrupted {
            break;
        }
    }
    debug!(slot = ctx.slot, "worker stopped");
}

fn publish_slot(ctx: &WorkerCtx) {
    ctx.sink
        .publish(Event::SlotStatusChanged(snapshot_slot(&ctx.slots, ctx.slot)));
}

fn snapshot_slot(slots: &[Mutex<SlotState>], index: usize) -> SlotSnapshot {
    let state = lock(&slots[index]);
    SlotSnapshot {
        slot: index,
        busy: state.item.is_some(),
        item: state.item.clone(),
        started_at: state.started_at,
        last_activity_at: state.last_activity_at,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
