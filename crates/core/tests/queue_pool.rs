//! Queue and worker pool integration tests.
//!
//! Uses a scripted runner instead of the full workflow so slot scheduling,
//! deduplication and cancellation can be observed precisely.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use cratedigger_core::{
    testing::{fixtures, RecordingEventSink},
    CancellationToken, DownloadQueue, DownloadQueueItem, DownloadState, EnqueueOutcome, Event,
    EventSink, QueueConfig, WorkerPool, WorkflowRunner,
};

/// Runner that holds each item until a permit is released.
struct GatedRunner {
    gate: Semaphore,
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl GatedRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl WorkflowRunner for GatedRunner {
    async fn run(&self, _item: &DownloadQueueItem, token: CancellationToken) -> DownloadState {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let state = tokio::select! {
            _ = token.cancelled() => DownloadState::Failed,
            permit = self.gate.acquire() => {
                permit.unwrap().forget();
                DownloadState::Completed
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        state
    }
}

async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) {
    let start = tokio::time::Instant::now();
    while !check() {
        assert!(start.elapsed() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_three_items_two_slots() {
    let sink: Arc<dyn EventSink> = Arc::new(RecordingEventSink::new());
    let queue = Arc::new(DownloadQueue::new(sink.clone()));
    let runner = GatedRunner::new();
    let pool = WorkerPool::start(&QueueConfig { slots: 2 }, queue.clone(), runner.clone(), sink);

    for folder in ["One", "Two", "Three"] {
        assert_eq!(
            queue.enqueue(fixtures::queue_item("a1", folder, "rg")),
            EnqueueOutcome::Added
        );
    }

    // Exactly two run concurrently, the third waits
    wait_until(Duration::from_secs(2), || {
        runner.running.load(Ordering::SeqCst) == 2
    })
    .await;
    assert_eq!(queue.pending_len(), 1);
    assert_eq!(pool.status().slots.iter().filter(|s| s.busy).count(), 2);

    for _ in 0..3 {
        runner.gate.add_permits(1);
    }
    wait_until(Duration::from_secs(2), || {
        runner.finished.load(Ordering::SeqCst) == 3
    })
    .await;
    assert_eq!(runner.peak.load(Ordering::SeqCst), 2);

    pool.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_enqueue_never_occupies_two_slots() {
    let sink: Arc<dyn EventSink> = Arc::new(RecordingEventSink::new());
    let queue = Arc::new(DownloadQueue::new(sink.clone()));
    let runner = GatedRunner::new();
    let pool = WorkerPool::start(&QueueConfig { slots: 2 }, queue.clone(), runner.clone(), sink);

    queue.enqueue(fixtures::queue_item("a1", "Grace", "rg"));
    wait_until(Duration::from_secs(2), || {
        runner.running.load(Ordering::SeqCst) == 1
    })
    .await;

    assert_eq!(
        queue.enqueue(fixtures::queue_item("a1", "Grace", "rg")),
        EnqueueOutcome::AlreadyActive
    );
    // Give the second slot a chance to (incorrectly) pick something up
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runner.running.load(Ordering::SeqCst), 1);

    runner.gate.add_permits(1);
    wait_until(Duration::from_secs(2), || {
        runner.finished.load(Ordering::SeqCst) == 1
    })
    .await;

    // Once the run finished, the key can be queued again
    wait_until(Duration::from_secs(2), || !queue.is_active("a1|Grace")).await;
    assert_eq!(
        queue.enqueue(fixtures::queue_item("a1", "Grace", "rg")),
        EnqueueOutcome::Added
    );

    runner.gate.add_permits(1);
    pool.shutdown().await;
}

#[tokio::test]
async fn test_move_to_back_reorders_pending() {
    let sink: Arc<dyn EventSink> = Arc::new(RecordingEventSink::new());
    let queue = Arc::new(DownloadQueue::new(sink));

    queue.enqueue(fixtures::queue_item("a1", "One", "rg"));
    queue.enqueue(fixtures::queue_item("a1", "Two", "rg"));
    queue.enqueue(fixtures::queue_item("a1", "Three", "rg"));

    assert!(queue.move_to_back("a1|One"));
    let order: Vec<String> = queue
        .pending()
        .iter()
        .map(|i| i.release_folder_name.clone())
        .collect();
    assert_eq!(order, vec!["Two", "Three", "One"]);
}

#[tokio::test]
async fn test_slot_events_are_published() {
    let recording = Arc::new(RecordingEventSink::new());
    let sink: Arc<dyn EventSink> = recording.clone();
    let queue = Arc::new(DownloadQueue::new(sink.clone()));
    let runner = GatedRunner::new();
    let pool = WorkerPool::start(&QueueConfig { slots: 1 }, queue.clone(), runner.clone(), sink);

    queue.enqueue(fixtures::queue_item("a1", "Grace", "rg"));
    wait_until(Duration::from_secs(2), || {
        runner.running.load(Ordering::SeqCst) == 1
    })
    .await;
    runner.gate.add_permits(1);
    wait_until(Duration::from_secs(2), || {
        runner.finished.load(Ordering::SeqCst) == 1
    })
    .await;
    wait_until(Duration::from_secs(2), || {
        recording
            .events()
            .iter()
            .filter(|e| matches!(e, Event::SlotStatusChanged(_)))
            .count()
            >= 2
    })
    .await;

    let slot_events: Vec<_> = recording
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::SlotStatusChanged(s) => Some(s),
            _ => None,
        })
        .collect();
    // Busy first, idle after
    assert!(slot_events.first().unwrap().busy);
    assert!(!slot_events.last().unwrap().busy);
    assert!(recording
        .events()
        .iter()
        .any(|e| matches!(e, Event::QueueChanged { .. })));

    pool.shutdown().await;
}

#[tokio::test]
async fn test_cancel_pending_vs_active() {
    let sink: Arc<dyn EventSink> = Arc::new(RecordingEventSink::new());
    let queue = Arc::new(DownloadQueue::new(sink.clone()));
    let runner = GatedRunner::new();
    let pool = WorkerPool::start(&QueueConfig { slots: 1 }, queue.clone(), runner.clone(), sink);

    queue.enqueue(fixtures::queue_item("a1", "One", "rg"));
    queue.enqueue(fixtures::queue_item("a1", "Two", "rg"));
    wait_until(Duration::from_secs(2), || {
        runner.running.load(Ordering::SeqCst) == 1
    })
    .await;

    // Pending item: removed outright
    assert!(pool.cancel("a1|Two"));
    assert_eq!(queue.pending_len(), 0);

    // Active item: cancelled via its token, slot freed
    assert!(pool.cancel("a1|One"));
    wait_until(Duration::from_secs(2), || {
        runner.finished.load(Ordering::SeqCst) == 1
    })
    .await;
    wait_until(Duration::from_secs(2), || !queue.is_active("a1|One")).await;

    // Unknown key reports false
    assert!(!pool.cancel("a1|Missing"));

    pool.shutdown().await;
}
