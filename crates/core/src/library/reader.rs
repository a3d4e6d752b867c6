//! Library readers.
//!
//! The cache never touches the filesystem directly; it goes through a
//! [`LibraryReader`] so tests can feed it synthetic libraries.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{ArtistDescriptor, ReleaseDescriptor};
use super::LibraryError;

const ARTIST_DESCRIPTOR: &str = "artist.json";
const RELEASE_DESCRIPTOR: &str = "release.json";

#[async_trait]
pub trait LibraryReader: Send + Sync {
    /// Enumerate all artists in the library.
    async fn read_artists(&self) -> Result<Vec<ArtistDescriptor>, LibraryError>;

    /// Enumerate the releases under one artist's directory.
    async fn read_releases(&self, artist_path: &Path)
        -> Result<Vec<ReleaseDescriptor>, LibraryError>;
}

/// Reads a library laid out as `<root>/<artist>/<release>/` with JSON
/// descriptors at each level. Directories without a descriptor are skipped;
/// a descriptor that fails to parse aborts the scan.
pub struct FsLibraryReader {
    root: PathBuf,
}

impl FsLibraryReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LibraryReader for FsLibraryReader {
    async fn read_artists(&self) -> Result<Vec<ArtistDescriptor>, LibraryError> {
        let mut artists = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| LibraryError::Read(format!("{}: {e}", self.root.display())))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LibraryError::Read(e.to_string()))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let descriptor_path = path.join(ARTIST_DESCRIPTOR);
            let json = match tokio::fs::read_to_string(&descriptor_path).await {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no artist descriptor, skipping");
                    continue;
                }
                Err(e) => {
                    return Err(LibraryError::Read(format!(
                        "{}: {e}",
                        descriptor_path.display()
                    )))
                }
            };
            let mut artist: ArtistDescriptor =
                serde_json::from_str(&json).map_err(|e| LibraryError::Parse {
                    path: descriptor_path.display().to_string(),
                    message: e.to_string(),
                })?;
            artist.path = path;
            artists.push(artist);
        }

        Ok(artists)
    }

    async fn read_releases(
        &self,
        artist_path: &Path,
    ) -> Result<Vec<ReleaseDescriptor>, LibraryError> {
        let mut releases = Vec::new();
        let mut entries = tokio::fs::read_dir(artist_path)
            .await
            .map_err(|e| LibraryError::Read(format!("{}: {e}", artist_path.display())))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LibraryError::Read(e.to_string()))?
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let descriptor_path = path.join(RELEASE_DESCRIPTOR);
            let json = match tokio::fs::read_to_string(&descriptor_path).await {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no release descriptor, skipping");
                    continue;
                }
                Err(e) => {
                    return Err(LibraryError::Read(format!(
                        "{}: {e}",
                        descriptor_path.display()
                    )))
                }
            };
            let mut release: ReleaseDescriptor =
                serde_json::from_str(&json).map_err(|e| LibraryError::Parse {
                    path: descriptor_path.display().to_string(),
                    message: e.to_string(),
                })?;
            let folder = entry.file_name().to_string_lossy().to_string();
            release.folder_name = folder;
            releases.push(release);
        }

        Ok(releases)
    }
}
