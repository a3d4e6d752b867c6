//! Types for the history tracker.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::DownloadState;

/// One recorded state change of a release. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadStateTransition {
    pub from_state: DownloadState,
    pub to_state: DownloadState,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds spent in `from_state`.
    pub duration_in_previous_state_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The single mutable row describing one in-flight release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentDownloadState {
    pub correlation_id: String,
    pub state: DownloadState,
    /// Provider currently being tried, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    /// 0-based index of that provider in the fallback order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_index: Option<usize>,
    /// Total providers configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_total: Option<usize>,
    /// Last recorded error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the current state was entered.
    pub state_started_at: DateTime<Utc>,
}

impl CurrentDownloadState {
    /// How long the release has been in its current state.
    pub fn current_state_duration(&self, now: DateTime<Utc>) -> Duration {
        now - self.state_started_at
    }
}
