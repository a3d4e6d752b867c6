//! In-memory history tracker.

use chrono::Utc;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::events::{Event, EventSink};
use crate::workflow::DownloadState;

use super::config::HistoryConfig;
use super::types::{CurrentDownloadState, DownloadStateTransition};

struct ReleaseHistory {
    entries: VecDeque<DownloadStateTransition>,
    last_touched: chrono::DateTime<Utc>,
}

struct Inner {
    histories: HashMap<String, ReleaseHistory>,
    current: HashMap<String, CurrentDownloadState>,
}

/// Owns the per-release transition logs and current-state rows.
///
/// One explicit, shared service handle; all callers get it by reference.
/// Lock scope is the whole tracker: entries for one release are only ever
/// appended by the single slot that owns it, so contention is negligible.
pub struct HistoryTracker {
    config: HistoryConfig,
    inner: Mutex<Inner>,
    sink: Arc<dyn EventSink>,
}

impl HistoryTracker {
    pub fn new(config: HistoryConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                histories: HashMap::new(),
                current: HashMap::new(),
            }),
            sink,
        }
    }

    /// Record a transition to `to_state`, deriving `from_state` and the time
    /// spent in it from the current row. Terminal transitions clear the
    /// current row; the appended history survives.
    pub fn record_transition(
        &self,
        correlation_id: &str,
        to_state: DownloadState,
        notes: Option<String>,
    ) -> DownloadStateTransition {
        let now = Utc::now();
        let transition = {
            let mut inner = self.lock();

            let (from_state, duration_ms) = match inner.current.get(correlation_id) {
                Some(current) => (
                    current.state,
                    (now - current.state_started_at).num_milliseconds(),
                ),
                None => (DownloadState::Idle, 0),
            };

            let transition = DownloadStateTransition {
                from_state,
                to_state,
                timestamp: now,
                duration_in_previous_state_ms: duration_ms,
                notes,
            };

            self.append(&mut inner, correlation_id, transition.clone());

            if to_state.is_terminal() {
                inner.current.remove(correlation_id);
            } else {
                let row = inner
                    .current
                    .entry(correlation_id.to_string())
                    .or_insert_with(|| CurrentDownloadState {
                        correlation_id: correlation_id.to_string(),
                        state: to_state,
                        provider_name: None,
                        provider_index: None,
                        provider_total: None,
                        error_message: None,
                        state_started_at: now,
                    });
                row.state = to_state;
                row.state_started_at = now;
            }

            transition
        };

        debug!(
            correlation_id,
            from = %transition.from_state,
            to = %transition.to_state,
            "state transition recorded"
        );
        self.sink.publish(Event::HistoryUpdated {
            correlation_id: correlation_id.to_string(),
        });

        transition
    }

    /// Update which provider the in-flight release is currently on.
    pub fn set_provider(
        &self,
        correlation_id: &str,
        name: &str,
        index: usize,
        total: usize,
    ) {
        let mut inner = self.lock();
        if let Some(row) = inner.current.get_mut(correlation_id) {
            row.provider_name = Some(name.to_string());
            row.provider_index = Some(index);
            row.provider_total = Some(total);
        }
    }

    /// Record an error message on the in-flight row without transitioning.
    pub fn set_error(&self, correlation_id: &str, message: &str) {
        let mut inner = self.lock();
        if let Some(row) = inner.current.get_mut(correlation_id) {
            row.error_message = Some(message.to_string());
        }
    }

    /// Transition log for one release, oldest first.
    pub fn history(&self, correlation_id: &str) -> Vec<DownloadStateTransition> {
        self.lock()
            .histories
            .get(correlation_id)
            .map(|h| h.entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current row for one in-flight release.
    pub fn current(&self, correlation_id: &str) -> Option<CurrentDownloadState> {
        self.lock().current.get(correlation_id).cloned()
    }

    /// All in-flight rows.
    pub fn all_current(&self) -> Vec<CurrentDownloadState> {
        self.lock().current.values().cloned().collect()
    }

    fn append(&self, inner: &mut Inner, correlation_id: &str, transition: DownloadStateTransition) {
        let now = Utc::now();
        let history = inner
            .histories
            .entry(correlation_id.to_string())
            .or_insert_with(|| ReleaseHistory {
                entries: VecDeque::new(),
                last_touched: now,
            });
        history.last_touched = now;
        history.entries.push_back(transition);
        while history.entries.len() > self.config.max_entries_per_release {
            history.entries.pop_front();
        }

        // Evict least recently touched releases beyond the cap
        while inner.histories.len() > self.config.max_releases {
            let Some(oldest) = inner
                .histories
                .iter()
                .min_by_key(|(_, h)| h.last_touched)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            inner.histories.remove(&oldest);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-append; the log is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
