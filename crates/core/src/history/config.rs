//! History retention configuration.

use serde::{Deserialize, Serialize};

/// Bounded retention for the in-memory history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Transitions kept per release; oldest evicted first.
    #[serde(default = "default_max_entries_per_release")]
    pub max_entries_per_release: usize,

    /// Distinct releases tracked; least recently touched evicted first.
    #[serde(default = "default_max_releases")]
    pub max_releases: usize,
}

fn default_max_entries_per_release() -> usize {
    50
}

fn default_max_releases() -> usize {
    500
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries_per_release: default_max_entries_per_release(),
            max_releases: default_max_releases(),
        }
    }
}
