//! Fallback executor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts governing one provider attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Hard limit on one provider's search call.
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    /// Abandon a transfer when no file completes for this long. The timer
    /// resets on every completed file.
    #[serde(default = "default_no_data_timeout")]
    pub no_data_timeout_secs: u64,
}

fn default_search_timeout() -> u64 {
    30
}

fn default_no_data_timeout() -> u64 {
    120
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            no_data_timeout_secs: default_no_data_timeout(),
        }
    }
}

impl FallbackConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn no_data_timeout(&self) -> Duration {
        Duration::from_secs(self.no_data_timeout_secs)
    }
}
