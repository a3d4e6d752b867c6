//! Types for the acquisition workflow.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::metadata::MetadataError;

/// Public progress state of one release acquisition.
///
/// `Searching` covers both the catalog lookup and provider candidate search;
/// `Downloading` is the active transfer; `Processing` is post-fetch file
/// placement. Transitions are monotonic within one run, the two terminal
/// states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    #[default]
    Idle,
    Searching,
    Downloading,
    Processing,
    Completed,
    Failed,
}

impl DownloadState {
    /// Whether this state ends a workflow run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Completed | DownloadState::Failed)
    }

    /// Position in the forward progression of one run; both terminal states
    /// share the final slot. Recorded transitions never move backwards.
    pub fn ordinal(&self) -> u8 {
        match self {
            DownloadState::Idle => 0,
            DownloadState::Searching => 1,
            DownloadState::Downloading => 2,
            DownloadState::Processing => 3,
            DownloadState::Completed => 4,
            DownloadState::Failed => 4,
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadState::Idle => "idle",
            DownloadState::Searching => "searching",
            DownloadState::Downloading => "downloading",
            DownloadState::Processing => "processing",
            DownloadState::Completed => "completed",
            DownloadState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Errors that terminate a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The catalog lookup returned nothing. Terminal, no retry.
    #[error("release not found in metadata catalog: {0}")]
    NotFound(String),

    /// No candidate variant could be selected for fetching.
    #[error("no suitable release variant: {0}")]
    NoCandidate(String),

    /// Every provider was exhausted without a usable result.
    #[error("no download found: {0}")]
    NoDownloadFound(String),

    /// The user cancelled the in-flight fetch.
    #[error("cancelled")]
    Cancelled,

    /// Catalog backend failure.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Library cache failure during the processing phase.
    #[error("library cache error: {0}")]
    Library(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(DownloadState::Completed.is_terminal());
        assert!(DownloadState::Failed.is_terminal());
        assert!(!DownloadState::Downloading.is_terminal());
        assert!(!DownloadState::Idle.is_terminal());
    }

    #[test]
    fn test_ordinal_monotonic() {
        let run = [
            DownloadState::Idle,
            DownloadState::Searching,
            DownloadState::Downloading,
            DownloadState::Processing,
            DownloadState::Completed,
        ];
        for pair in run.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
        // Failed can be entered from anywhere
        assert_eq!(
            DownloadState::Failed.ordinal(),
            DownloadState::Completed.ordinal()
        );
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&DownloadState::Searching).unwrap(),
            "\"searching\""
        );
        assert_eq!(
            serde_json::to_string(&DownloadState::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DownloadState::Downloading.to_string(), "downloading");
    }
}
