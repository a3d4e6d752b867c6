//! Mock library reader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::library::{
    ArtistDescriptor, LibraryError, LibraryReader, ReleaseDescriptor, TrackDescriptor,
};

#[derive(Default)]
struct Inner {
    artists: Vec<ArtistDescriptor>,
    releases: HashMap<PathBuf, Vec<ReleaseDescriptor>>,
    fail_with: Option<String>,
}

/// Mock implementation of [`LibraryReader`] serving an in-memory library.
#[derive(Default)]
pub struct MockLibraryReader {
    inner: Mutex<Inner>,
    scans: AtomicUsize,
}

impl MockLibraryReader {
    /// A library with no artists at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an artist with its releases. The artist path is synthesized from
    /// its name.
    pub fn add_artist(&self, id: &str, name: &str, releases: Vec<ReleaseDescriptor>) {
        let path = Path::new("/library").join(name);
        let mut inner = self.lock();
        inner.artists.push(ArtistDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            path: path.clone(),
        });
        inner.releases.insert(path, releases);
    }

    /// Make every read fail until cleared.
    pub fn fail_with(&self, message: &str) {
        self.lock().fail_with = Some(message.to_string());
    }

    /// Number of artist-list scans served so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A release descriptor for mock libraries.
pub fn release_descriptor(
    folder: &str,
    title: &str,
    release_group_id: Option<&str>,
    tracks: Vec<TrackDescriptor>,
) -> ReleaseDescriptor {
    ReleaseDescriptor {
        title: title.to_string(),
        release_group_id: release_group_id.map(|s| s.to_string()),
        tracks,
        folder_name: folder.to_string(),
    }
}

#[async_trait]
impl LibraryReader for MockLibraryReader {
    async fn read_artists(&self) -> Result<Vec<ArtistDescriptor>, LibraryError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let inner = self.lock();
        if let Some(message) = &inner.fail_with {
            return Err(LibraryError::Read(message.clone()));
        }
        Ok(inner.artists.clone())
    }

    async fn read_releases(
        &self,
        artist_path: &Path,
    ) -> Result<Vec<ReleaseDescriptor>, LibraryError> {
        let inner = self.lock();
        if let Some(message) = &inner.fail_with {
            return Err(LibraryError::Read(message.clone()));
        }
        Ok(inner.releases.get(artist_path).cloned().unwrap_or_default())
    }
}
