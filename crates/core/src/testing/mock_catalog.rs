//! Mock metadata catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::metadata::{CatalogTrack, MetadataCatalog, MetadataError, ReleaseCandidate};

#[derive(Default)]
struct Inner {
    candidates: HashMap<String, Vec<ReleaseCandidate>>,
    tracks: HashMap<String, Vec<CatalogTrack>>,
    tracks_requested: Vec<String>,
    fail_with: Option<String>,
}

/// Mock implementation of [`MetadataCatalog`].
///
/// Responses are configured per release group / release id; lookups of
/// anything unconfigured return [`MetadataError::NotFound`]. Track list
/// requests are recorded for assertions.
#[derive(Default)]
pub struct MockMetadataCatalog {
    inner: Mutex<Inner>,
}

impl MockMetadataCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the candidate list for a release group id.
    pub fn add_candidates(&self, release_group_id: &str, candidates: Vec<ReleaseCandidate>) {
        self.lock()
            .candidates
            .insert(release_group_id.to_string(), candidates);
    }

    /// Configure the track list for a release id.
    pub fn add_tracks(&self, release_id: &str, tracks: Vec<CatalogTrack>) {
        self.lock().tracks.insert(release_id.to_string(), tracks);
    }

    /// Make every call fail with a backend error until cleared.
    pub fn fail_with(&self, message: &str) {
        self.lock().fail_with = Some(message.to_string());
    }

    /// Release ids whose track lists were requested, in order.
    pub fn tracks_requested(&self) -> Vec<String> {
        self.lock().tracks_requested.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MetadataCatalog for MockMetadataCatalog {
    async fn get_release_candidates(
        &self,
        release_group_id: &str,
    ) -> Result<Vec<ReleaseCandidate>, MetadataError> {
        let inner = self.lock();
        if let Some(message) = &inner.fail_with {
            return Err(MetadataError::Backend(message.clone()));
        }
        inner
            .candidates
            .get(release_group_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(release_group_id.to_string()))
    }

    async fn get_release_tracks(
        &self,
        release_id: &str,
    ) -> Result<Vec<CatalogTrack>, MetadataError> {
        let mut inner = self.lock();
        if let Some(message) = &inner.fail_with {
            return Err(MetadataError::Backend(message.clone()));
        }
        inner.tracks_requested.push(release_id.to_string());
        inner
            .tracks
            .get(release_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(release_id.to_string()))
    }
}
