//! End-to-end acquisition lifecycle tests.
//!
//! These tests drive queued releases through the whole stack: queue ->
//! worker pool -> workflow -> catalog/scorer -> provider fallback ->
//! history, with all external collaborators mocked.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cratedigger_core::{
    testing::{fixtures, MockLibraryReader, MockMetadataCatalog, MockProvider, RecordingEventSink},
    AcquisitionWorkflow, DownloadQueue, DownloadState, EnqueueOutcome, EventSink, FallbackConfig,
    FallbackExecutor, HistoryConfig, HistoryTracker, LibraryCache, MediaAvailability,
    OverrideStore, Provider, QueueConfig, ScorerConfig, WorkerPool,
};

/// Test helper wiring every collaborator of the acquisition stack.
struct TestHarness {
    catalog: Arc<MockMetadataCatalog>,
    history: Arc<HistoryTracker>,
    library: Arc<LibraryCache>,
    sink: Arc<RecordingEventSink>,
    queue: Arc<DownloadQueue>,
    pool: WorkerPool,
}

impl TestHarness {
    fn new(slots: usize, providers: Vec<Arc<dyn Provider>>) -> Self {
        let catalog = Arc::new(MockMetadataCatalog::new());
        let sink = Arc::new(RecordingEventSink::new());
        let event_sink: Arc<dyn EventSink> = sink.clone();
        let history = Arc::new(HistoryTracker::new(
            HistoryConfig::default(),
            event_sink.clone(),
        ));

        let reader = MockLibraryReader::empty();
        let tracks = (1..=2)
            .map(|i| cratedigger_core::library::TrackDescriptor {
                number: i,
                title: format!("Track {i}"),
                file_name: None,
            })
            .collect();
        reader.add_artist(
            "a1",
            "Jeff Buckley",
            vec![cratedigger_core::testing::release_descriptor(
                "Grace",
                "Grace",
                Some("rg1"),
                tracks,
            )],
        );
        let library = Arc::new(LibraryCache::new(Arc::new(reader)));

        let executor = Arc::new(FallbackExecutor::new(
            providers,
            FallbackConfig {
                search_timeout_secs: 1,
                no_data_timeout_secs: 2,
            },
        ));
        let workflow = Arc::new(AcquisitionWorkflow::new(
            catalog.clone(),
            executor,
            library.clone(),
            history.clone(),
            Arc::new(OverrideStore::new()),
            event_sink.clone(),
            ScorerConfig::default(),
            PathBuf::from("/tmp/cratedigger-test"),
        ));

        let queue = Arc::new(DownloadQueue::new(event_sink.clone()));
        let pool = WorkerPool::start(
            &QueueConfig { slots },
            queue.clone(),
            workflow,
            event_sink,
        );

        Self {
            catalog,
            history,
            library,
            sink,
            queue,
            pool,
        }
    }

    async fn wait_for_terminal(&self, queue_key: &str) -> DownloadState {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let last = self
                .history
                .history(queue_key)
                .last()
                .map(|t| t.to_state)
                .filter(|s| s.is_terminal());
            if let Some(state) = last {
                // Let the slot finish its bookkeeping too
                let key = queue_key.to_string();
                while self.queue.is_active(&key) {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                return state;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "no terminal state for {queue_key}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[tokio::test]
async fn test_enqueued_release_runs_to_completed() {
    let provider = Arc::new(MockProvider::delivering("slsk", 10));
    let harness = TestHarness::new(2, vec![provider]);
    harness
        .catalog
        .add_candidates("rg1", vec![fixtures::album_candidate("r1", "Grace", 10)]);
    harness.catalog.add_tracks("r1", fixtures::track_list(10));

    let item = fixtures::queue_item("a1", "Grace", "rg1");
    assert_eq!(harness.queue.enqueue(item), EnqueueOutcome::Added);

    let state = harness.wait_for_terminal("a1|Grace").await;
    assert_eq!(state, DownloadState::Completed);

    // Full transition chain was recorded
    let states: Vec<_> = harness
        .history
        .history("a1|Grace")
        .iter()
        .map(|t| t.to_state)
        .collect();
    assert_eq!(
        states,
        vec![
            DownloadState::Searching,
            DownloadState::Downloading,
            DownloadState::Processing,
            DownloadState::Completed,
        ]
    );

    // The library now reports the release as available
    let release = harness
        .library
        .get_release("a1", "Grace")
        .await
        .unwrap()
        .unwrap();
    assert!(!release.tracks.is_empty());
    assert!(release
        .tracks
        .iter()
        .all(|t| t.status == MediaAvailability::Available));

    // Progress events reached the sink with matching file counts
    let progress = harness.sink.progress();
    let completed = progress
        .iter()
        .find(|p| p.state == DownloadState::Completed)
        .expect("completed progress event");
    assert_eq!(completed.files_completed, 10);
    assert_eq!(completed.artist_name, "Artist a1");

    harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_fallback_uses_second_provider() {
    let p1 = Arc::new(MockProvider::hanging("gnutella"));
    let p2 = Arc::new(MockProvider::delivering("slsk", 4));
    let harness = TestHarness::new(1, vec![p1.clone(), p2.clone()]);
    harness
        .catalog
        .add_candidates("rg1", vec![fixtures::album_candidate("r1", "Grace", 4)]);
    harness.catalog.add_tracks("r1", fixtures::track_list(4));

    harness
        .queue
        .enqueue(fixtures::queue_item("a1", "Grace", "rg1"));

    let state = harness.wait_for_terminal("a1|Grace").await;
    assert_eq!(state, DownloadState::Completed);

    // First provider timed out, second delivered
    assert_eq!(p1.search_count(), 1);
    assert_eq!(p1.fetch_count(), 0);
    assert_eq!(p2.fetch_count(), 1);

    // The delivering provider is recorded in the durable history
    let history = harness.history.history("a1|Grace");
    let processing = history
        .iter()
        .find(|t| t.to_state == DownloadState::Processing)
        .expect("processing transition");
    assert!(processing.notes.as_deref().unwrap().contains("slsk"));

    harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_provider_exhaustion_lands_on_failed() {
    let p1 = Arc::new(MockProvider::empty("gnutella"));
    let p2 = Arc::new(MockProvider::failing_transfer("slsk"));
    let harness = TestHarness::new(1, vec![p1, p2]);
    harness
        .catalog
        .add_candidates("rg1", vec![fixtures::album_candidate("r1", "Grace", 4)]);
    harness.catalog.add_tracks("r1", fixtures::track_list(4));

    harness
        .queue
        .enqueue(fixtures::queue_item("a1", "Grace", "rg1"));

    let state = harness.wait_for_terminal("a1|Grace").await;
    assert_eq!(state, DownloadState::Failed);

    let history = harness.history.history("a1|Grace");
    let note = history.last().unwrap().notes.clone().unwrap();
    assert!(note.contains("2 provider"), "unexpected note: {note}");

    harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_cancel_mid_download_records_note_and_frees_slot() {
    let provider = Arc::new(MockProvider::hanging_transfer("slsk", 10));
    let harness = TestHarness::new(1, vec![provider]);
    harness
        .catalog
        .add_candidates("rg1", vec![fixtures::album_candidate("r1", "Grace", 10)]);
    harness.catalog.add_tracks("r1", fixtures::track_list(10));
    harness.catalog.add_candidates(
        "rg2",
        vec![fixtures::album_candidate("r2", "Sketches", 10)],
    );
    harness.catalog.add_tracks("r2", fixtures::track_list(10));

    harness
        .queue
        .enqueue(fixtures::queue_item("a1", "Grace", "rg1"));
    harness
        .queue
        .enqueue(fixtures::queue_item("a1", "Sketches", "rg2"));

    // Wait until the first item is downloading
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while harness
        .history
        .current("a1|Grace")
        .map(|c| c.state)
        .unwrap_or(DownloadState::Idle)
        != DownloadState::Downloading
    {
        assert!(tokio::time::Instant::now() < deadline, "never started downloading");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    // While active, re-enqueueing the same key is refused
    assert_eq!(
        harness
            .queue
            .enqueue(fixtures::queue_item("a1", "Grace", "rg1")),
        EnqueueOutcome::AlreadyActive
    );

    assert!(harness.pool.cancel("a1|Grace"));

    let state = harness.wait_for_terminal("a1|Grace").await;
    assert_eq!(state, DownloadState::Failed);
    let history = harness.history.history("a1|Grace");
    assert_eq!(
        history.last().unwrap().notes.as_deref(),
        Some("cancelled by user")
    );

    // The freed slot picks up the second item; it hangs too, so cancel it
    // once it is running and make sure it settles as well.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !harness.queue.is_active("a1|Sketches") {
        assert!(tokio::time::Instant::now() < deadline, "second item never started");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(harness.pool.cancel("a1|Sketches"));
    harness.wait_for_terminal("a1|Sketches").await;

    harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_catalog_miss_fails_without_provider_search() {
    let provider = Arc::new(MockProvider::delivering("slsk", 4));
    let harness = TestHarness::new(1, vec![provider.clone()]);
    // No candidates configured for rg1: the catalog reports NotFound

    harness
        .queue
        .enqueue(fixtures::queue_item("a1", "Grace", "rg1"));

    let state = harness.wait_for_terminal("a1|Grace").await;
    assert_eq!(state, DownloadState::Failed);
    assert_eq!(provider.search_count(), 0);

    harness.pool.shutdown().await;
}
