//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external collaborator traits (metadata
//! catalog, fetch providers, library reader) plus a recording event sink,
//! so workflow and queue behavior can be tested end to end without real
//! infrastructure.

mod mock_catalog;
mod mock_library;
mod mock_provider;
mod recording_sink;

pub use mock_catalog::MockMetadataCatalog;
pub use mock_library::{release_descriptor, MockLibraryReader};
pub use mock_provider::MockProvider;
pub use recording_sink::RecordingEventSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::metadata::{CatalogTrack, PrimaryType, ReleaseCandidate, ReleaseStatus};
    use crate::queue::DownloadQueueItem;

    /// An official worldwide album candidate with reasonable defaults.
    pub fn album_candidate(external_id: &str, title: &str, track_count: u32) -> ReleaseCandidate {
        ReleaseCandidate {
            external_id: external_id.to_string(),
            title: title.to_string(),
            country: Some("XW".to_string()),
            status: ReleaseStatus::Official,
            primary_type: PrimaryType::Album,
            track_count,
            track_titles: (1..=track_count).map(|i| format!("Track {i}")).collect(),
            release_date: None,
            is_demo: false,
        }
    }

    /// A numbered track list.
    pub fn track_list(count: u32) -> Vec<CatalogTrack> {
        (1..=count)
            .map(|i| CatalogTrack {
                number: i,
                title: format!("Track {i}"),
                duration_ms: Some(180_000),
            })
            .collect()
    }

    /// A queue item with all lookup hints filled in.
    pub fn queue_item(artist_id: &str, folder: &str, release_group_id: &str) -> DownloadQueueItem {
        DownloadQueueItem {
            artist_id: artist_id.to_string(),
            release_folder_name: folder.to_string(),
            artist_name: Some(format!("Artist {artist_id}")),
            release_title: Some(folder.to_string()),
            release_group_id: Some(release_group_id.to_string()),
        }
    }
}
