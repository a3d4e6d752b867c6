use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::history::HistoryConfig;
use crate::provider::FallbackConfig;
use crate::queue::QueueConfig;
use crate::scorer::ScorerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Library paths configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root of the on-disk music library.
    pub root: PathBuf,
    /// Staging directory transfers land in before processing.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}
