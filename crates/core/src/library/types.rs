//! Library descriptor and cached-entity types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Availability of one track's media on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaAvailability {
    #[default]
    Missing,
    Queued,
    Downloading,
    Processing,
    Available,
}

impl MediaAvailability {
    /// Whether this status marks an acquisition still in progress. Settled
    /// statuses (`Missing`, `Available`) are what a disk re-scan derives on
    /// its own.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            MediaAvailability::Queued
                | MediaAvailability::Downloading
                | MediaAvailability::Processing
        )
    }
}

/// Artist descriptor as read from disk (`artist.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistDescriptor {
    pub id: String,
    pub name: String,
    /// Directory holding this artist's release folders.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Release descriptor as read from disk (`release.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group_id: Option<String>,
    #[serde(default)]
    pub tracks: Vec<TrackDescriptor>,
    /// Name of the directory the descriptor was found in.
    #[serde(skip)]
    pub folder_name: String,
}

/// One track entry within a release descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub number: u32,
    pub title: String,
    /// Media file for this track, relative to the release folder.
    /// Present only when the track has been acquired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// A track in the cache, with its derived availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTrack {
    pub number: u32,
    pub title: String,
    /// Lowercased title, precomputed for matching.
    pub title_lower: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub status: MediaAvailability,
}

/// A release in the cache. Carries its owning artist's id and name so
/// release-level search results are self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRelease {
    pub folder_name: String,
    pub title: String,
    pub title_lower: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group_id: Option<String>,
    pub artist_id: String,
    pub artist_name: String,
    pub tracks: Vec<CachedTrack>,
}

impl CachedRelease {
    /// File names of tracks already on disk.
    pub fn local_file_names(&self) -> Vec<String> {
        self.tracks
            .iter()
            .filter_map(|t| t.file_name.clone())
            .collect()
    }
}

/// An artist in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedArtist {
    pub id: String,
    pub name: String,
    pub name_lower: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub releases: Vec<CachedRelease>,
}
