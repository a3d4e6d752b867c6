//! External metadata catalog contract.
//!
//! The catalog (MusicBrainz or similar) is an external collaborator. The core
//! only needs two operations from it: list the release variants of a release
//! group, and fetch the track list of one resolved release. Rate limiting and
//! caching are the catalog implementation's concern, not ours.

mod types;

pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a metadata catalog backend.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The requested release or release group does not exist.
    #[error("not found in catalog: {0}")]
    NotFound(String),

    /// The backend rejected or failed the request.
    #[error("catalog backend error: {0}")]
    Backend(String),

    /// The backend responded with something we could not parse.
    #[error("failed to parse catalog response: {0}")]
    ParseError(String),
}

/// Trait for external metadata catalog clients.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    /// List all release variants of a release group (or a single release id).
    ///
    /// An empty list means the id resolved to nothing usable; callers treat
    /// that the same as [`MetadataError::NotFound`].
    async fn get_release_candidates(
        &self,
        release_group_id: &str,
    ) -> Result<Vec<ReleaseCandidate>, MetadataError>;

    /// Fetch the ordered track list of one resolved release.
    async fn get_release_tracks(
        &self,
        release_id: &str,
    ) -> Result<Vec<CatalogTrack>, MetadataError>;
}
