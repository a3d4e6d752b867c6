//! The per-release acquisition workflow.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::{Event, EventSink, ProgressSnapshot};
use crate::history::HistoryTracker;
use crate::library::{LibraryCache, MediaAvailability};
use crate::metadata::{MetadataCatalog, ReleaseCandidate};
use crate::metrics;
use crate::provider::{
    CancellationToken, FallbackError, FallbackExecutor, FetchObserver, FetchQuery, FetchedFile,
};
use crate::queue::{DownloadQueueItem, WorkflowRunner};
use crate::scorer::{pick_default_candidate, score_candidates, ScorerConfig};

use super::overrides::OverrideStore;
use super::types::{DownloadState, WorkflowError};

/// Publishes progress snapshots and records history transitions for one run.
/// Doubles as the fetch observer so per-file progress flows out live.
struct ProgressReporter {
    correlation_id: String,
    run_id: Uuid,
    artist_name: String,
    release_title: String,
    history: Arc<HistoryTracker>,
    sink: Arc<dyn EventSink>,
    state: Mutex<DownloadState>,
    files_completed: AtomicU32,
    files_total: Mutex<Option<u32>>,
}

impl ProgressReporter {
    fn transition(&self, to: DownloadState, notes: Option<String>, status: &str) {
        *lock(&self.state) = to;
        self.history.record_transition(&self.correlation_id, to, notes);
        self.publish(status);
    }

    fn publish(&self, status: &str) {
        let snapshot = ProgressSnapshot {
            correlation_id: self.correlation_id.clone(),
            run_id: self.run_id,
            artist_name: self.artist_name.clone(),
            release_title: self.release_title.clone(),
            state: *lock(&self.state),
            files_completed: self.files_completed.load(Ordering::SeqCst),
            files_total: *lock(&self.files_total),
            status: status.to_string(),
            timestamp: Utc::now(),
        };
        self.sink.publish(Event::ProgressUpdated(snapshot));
    }
}

impl FetchObserver for ProgressReporter {
    fn provider_started(&self, name: &str, index: usize, total: usize) {
        self.history
            .set_provider(&self.correlation_id, name, index, total);
        self.publish(&format!("Trying provider {name} ({}/{total})", index + 1));
    }

    fn transfer_started(&self, name: &str, file_count: u32) {
        *lock(&self.files_total) = Some(file_count);
        // Only the first transfer enters Downloading; a later provider after
        // a failed transfer stays there.
        let entered = {
            let mut state = lock(&self.state);
            if state.ordinal() >= DownloadState::Downloading.ordinal() {
                false
            } else {
                *state = DownloadState::Downloading;
                true
            }
        };
        if entered {
            self.history
                .record_transition(&self.correlation_id, DownloadState::Downloading, None);
        }
        self.publish(&format!("Transferring {file_count} file(s) from {name}"));
    }

    fn file_completed(&self, file: &FetchedFile) {
        self.files_completed.fetch_add(1, Ordering::SeqCst);
        self.publish(&format!("Fetched {}", file.local_file_name));
    }

    fn transfer_failed(&self, name: &str, reason: &str) {
        self.history.set_error(&self.correlation_id, reason);
        self.publish(&format!("Transfer from {name} failed: {reason}"));
    }
}

/// Drives one queued release from Idle to a terminal state.
///
/// Searching covers the catalog lookup, candidate choice and provider
/// search; Downloading is the active transfer; Processing marks the fetched
/// files in the library. Every exit path lands on Completed or Failed with a
/// matching history entry, and the run itself never panics.
pub struct AcquisitionWorkflow {
    catalog: Arc<dyn MetadataCatalog>,
    executor: Arc<FallbackExecutor>,
    library: Arc<LibraryCache>,
    history: Arc<HistoryTracker>,
    overrides: Arc<OverrideStore>,
    sink: Arc<dyn EventSink>,
    scorer: ScorerConfig,
    download_dir: PathBuf,
}

impl AcquisitionWorkflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn MetadataCatalog>,
        executor: Arc<FallbackExecutor>,
        library: Arc<LibraryCache>,
        history: Arc<HistoryTracker>,
        overrides: Arc<OverrideStore>,
        sink: Arc<dyn EventSink>,
        scorer: ScorerConfig,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            executor,
            library,
            history,
            overrides,
            sink,
            scorer,
            download_dir,
        }
    }

    async fn run_inner(
        &self,
        item: &DownloadQueueItem,
        key: &str,
        token: &CancellationToken,
        reporter: &ProgressReporter,
        release_group_id: Option<String>,
        local_files: &[String],
    ) -> Result<usize, WorkflowError> {
        if token.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }

        let release_group_id = release_group_id.ok_or_else(|| {
            WorkflowError::NoCandidate(format!("no release group id known for {key}"))
        })?;
        let candidates = self.catalog.get_release_candidates(&release_group_id).await?;
        if candidates.is_empty() {
            return Err(WorkflowError::NotFound(release_group_id));
        }
        metrics::CANDIDATES_SCORED
            .with_label_values(&[])
            .observe(candidates.len() as f64);

        let chosen = self.choose(key, &candidates, local_files)?;
        info!(
            queue_key = key,
            release_id = %chosen.external_id,
            title = %chosen.title,
            "candidate chosen"
        );

        let expected_tracks = self.catalog.get_release_tracks(&chosen.external_id).await?;
        let query = FetchQuery {
            artist_name: reporter.artist_name.clone(),
            release_title: reporter.release_title.clone(),
            expected_tracks,
        };

        self.library
            .set_release_status(
                &item.artist_id,
                &item.release_folder_name,
                MediaAvailability::Downloading,
            )
            .await;

        let dest = self
            .download_dir
            .join(&item.artist_id)
            .join(&item.release_folder_name);
        let success = self
            .executor
            .fetch(&query, &dest, token, reporter)
            .await
            .map_err(|e| match e {
                FallbackError::Cancelled => WorkflowError::Cancelled,
                exhausted @ FallbackError::NoDownloadFound { .. } => {
                    WorkflowError::NoDownloadFound(exhausted.to_string())
                }
            })?;

        // The current row is gone after the terminal transition, so the
        // provider that delivered goes into the durable log here.
        reporter.transition(
            DownloadState::Processing,
            Some(format!("fetched by {}", success.provider_name)),
            &format!(
                "Processing {} file(s) from {}",
                success.files.len(),
                success.provider_name
            ),
        );
        self.library
            .set_release_status(
                &item.artist_id,
                &item.release_folder_name,
                MediaAvailability::Processing,
            )
            .await;

        Ok(success.files.len())
    }

    /// Pick the candidate to fetch. A user override wins outright; with local
    /// files on disk the file-aware scorer decides; otherwise the default
    /// edition ranking does.
    fn choose(
        &self,
        key: &str,
        candidates: &[ReleaseCandidate],
        local_files: &[String],
    ) -> Result<ReleaseCandidate, WorkflowError> {
        if let Some(id) = self.overrides.get(key) {
            return candidates
                .iter()
                .find(|c| c.external_id == id)
                .cloned()
                .ok_or_else(|| {
                    WorkflowError::NoCandidate(format!(
                        "pinned release {id} is not among the candidates"
                    ))
                });
        }

        let best = if local_files.is_empty() {
            pick_default_candidate(&self.scorer, candidates)
        } else {
            score_candidates(&self.scorer, candidates, local_files.len(), local_files)
                .into_iter()
                .next()
        };
        best.map(|s| s.candidate)
            .ok_or_else(|| WorkflowError::NoCandidate("no suitable candidate".to_string()))
    }
}

#[async_trait]
impl WorkflowRunner for AcquisitionWorkflow {
    async fn run(&self, item: &DownloadQueueItem, token: CancellationToken) -> DownloadState {
        let key = item.queue_key();
        let started = Instant::now();

        let release = match self
            .library
            .get_release(&item.artist_id, &item.release_folder_name)
            .await
        {
            Ok(release) => release,
            Err(e) => {
                warn!(queue_key = %key, error = %e, "library lookup failed, continuing without it");
                None
            }
        };
        let artist_name = item
            .artist_name
            .clone()
            .or_else(|| release.as_ref().map(|r| r.artist_name.clone()))
            .unwrap_or_else(|| item.artist_id.clone());
        let release_title = item
            .release_title
            .clone()
            .or_else(|| release.as_ref().map(|r| r.title.clone()))
            .unwrap_or_else(|| item.release_folder_name.clone());
        let release_group_id = item
            .release_group_id
            .clone()
            .or_else(|| release.as_ref().and_then(|r| r.release_group_id.clone()));
        let local_files = release
            .as_ref()
            .map(|r| r.local_file_names())
            .unwrap_or_default();

        let reporter = ProgressReporter {
            correlation_id: key.clone(),
            run_id: Uuid::new_v4(),
            artist_name,
            release_title,
            history: self.history.clone(),
            sink: self.sink.clone(),
            state: Mutex::new(DownloadState::Idle),
            files_completed: AtomicU32::new(0),
            files_total: Mutex::new(None),
        };
        reporter.transition(
            DownloadState::Searching,
            None,
            "Looking up release candidates",
        );

        let outcome = self
            .run_inner(item, &key, &token, &reporter, release_group_id, &local_files)
            .await;

        let (final_state, outcome_label) = match outcome {
            Ok(files) => {
                // Re-index so the fetched files and any updated descriptors
                // are visible; the availability marks below survive either way
                if let Err(e) = self.library.refresh().await {
                    warn!(queue_key = %key, error = %e, "library refresh after fetch failed");
                }
                self.library
                    .set_release_status(
                        &item.artist_id,
                        &item.release_folder_name,
                        MediaAvailability::Available,
                    )
                    .await;
                reporter.transition(
                    DownloadState::Completed,
                    None,
                    &format!("Completed with {files} file(s)"),
                );
                info!(queue_key = %key, files, "acquisition completed");
                (DownloadState::Completed, "completed")
            }
            Err(WorkflowError::Cancelled) => {
                // Completed files stay on disk; availability reverts until a
                // rescan or retry picks them up.
                self.library
                    .set_release_status(
                        &item.artist_id,
                        &item.release_folder_name,
                        MediaAvailability::Missing,
                    )
                    .await;
                reporter.transition(
                    DownloadState::Failed,
                    Some("cancelled by user".to_string()),
                    "Cancelled",
                );
                info!(queue_key = %key, "acquisition cancelled");
                (DownloadState::Failed, "cancelled")
            }
            Err(e) => {
                self.library
                    .set_release_status(
                        &item.artist_id,
                        &item.release_folder_name,
                        MediaAvailability::Missing,
                    )
                    .await;
                warn!(queue_key = %key, error = %e, "acquisition failed");
                reporter.transition(DownloadState::Failed, Some(e.to_string()), "Failed");
                (DownloadState::Failed, "failed")
            }
        };

        metrics::WORKFLOW_RUNS
            .with_label_values(&[outcome_label])
            .inc();
        metrics::WORKFLOW_DURATION
            .with_label_values(&[outcome_label])
            .observe(started.elapsed().as_secs_f64());
        final_state
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
