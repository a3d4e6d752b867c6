//! In-memory library cache.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::metrics;

use super::reader::LibraryReader;
use super::types::{CachedArtist, CachedRelease, CachedTrack, MediaAvailability};
use super::LibraryError;

/// (artist id, release folder, track number), all lookups lowercased on id.
type OverlayKey = (String, String, u32);

struct Snapshot {
    artists: Vec<CachedArtist>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

struct Inner {
    snapshot: Option<Snapshot>,
    /// In-flight availability marks applied on top of whatever the reader
    /// reports. Survive rebuilds so an active download is not reported as
    /// missing just because a re-scan ran mid-transfer. Settled statuses are
    /// never stored here: once a track is Available or Missing the next
    /// rebuild must reflect disk truth.
    overlays: HashMap<OverlayKey, MediaAvailability>,
}

/// Cached view of the on-disk library.
///
/// Built lazily on first query, rebuilt on demand via [`refresh`]. A failed
/// rebuild keeps the previous snapshot so readers never regress to empty.
///
/// [`refresh`]: LibraryCache::refresh
pub struct LibraryCache {
    reader: Arc<dyn LibraryReader>,
    inner: RwLock<Inner>,
}

impl LibraryCache {
    pub fn new(reader: Arc<dyn LibraryReader>) -> Self {
        Self {
            reader,
            inner: RwLock::new(Inner {
                snapshot: None,
                overlays: HashMap::new(),
            }),
        }
    }

    /// Full re-scan through the reader. On error the previous snapshot is
    /// retained and the error returned to the caller.
    pub async fn refresh(&self) -> Result<(), LibraryError> {
        let built = self.build_snapshot().await;
        let snapshot = match built {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "library rebuild failed, keeping previous snapshot");
                metrics::LIBRARY_REFRESHES.with_label_values(&["error"]).inc();
                return Err(e);
            }
        };

        let mut inner = self.inner.write().await;
        let mut snapshot = snapshot;
        for ((artist_id, folder, number), status) in &inner.overlays {
            apply_overlay(&mut snapshot, artist_id, folder, *number, *status);
        }
        let artists = snapshot.artists.len();
        inner.snapshot = Some(snapshot);
        drop(inner);

        metrics::LIBRARY_REFRESHES.with_label_values(&["ok"]).inc();
        info!(artists, "library cache rebuilt");
        Ok(())
    }

    /// Exact, case-insensitive lookup by artist id.
    pub async fn get_artist_by_id(&self, id: &str) -> Result<Option<CachedArtist>, LibraryError> {
        self.ensure_built().await?;
        let inner = self.inner.read().await;
        let Some(snapshot) = &inner.snapshot else {
            return Ok(None);
        };
        Ok(snapshot
            .by_id
            .get(&id.to_lowercase())
            .map(|&i| snapshot.artists[i].clone()))
    }

    /// Exact, case-insensitive lookup by artist name.
    pub async fn get_artist_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CachedArtist>, LibraryError> {
        self.ensure_built().await?;
        let inner = self.inner.read().await;
        let Some(snapshot) = &inner.snapshot else {
            return Ok(None);
        };
        Ok(snapshot
            .by_name
            .get(&name.to_lowercase())
            .map(|&i| snapshot.artists[i].clone()))
    }

    /// One release by owning artist id and folder name (case-insensitive).
    pub async fn get_release(
        &self,
        artist_id: &str,
        folder_name: &str,
    ) -> Result<Option<CachedRelease>, LibraryError> {
        let Some(artist) = self.get_artist_by_id(artist_id).await? else {
            return Ok(None);
        };
        let folder_lower = folder_name.to_lowercase();
        Ok(artist
            .releases
            .into_iter()
            .find(|r| r.folder_name.to_lowercase() == folder_lower))
    }

    /// Substring search over artist names. Prefix matches sort first, then
    /// alphabetical within each group. Capped at `limit`.
    pub async fn search_artists(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CachedArtist>, LibraryError> {
        self.ensure_built().await?;
        let term = term.to_lowercase();
        let inner = self.inner.read().await;
        let Some(snapshot) = &inner.snapshot else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<&CachedArtist> = snapshot
            .artists
            .iter()
            .filter(|a| a.name_lower.contains(&term))
            .collect();
        matches.sort_by(|a, b| {
            let a_prefix = a.name_lower.starts_with(&term);
            let b_prefix = b.name_lower.starts_with(&term);
            b_prefix
                .cmp(&a_prefix)
                .then_with(|| a.name_lower.cmp(&b.name_lower))
        });
        Ok(matches.into_iter().take(limit).cloned().collect())
    }

    /// Substring search over release titles, same ordering as artist search.
    pub async fn search_releases(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CachedRelease>, LibraryError> {
        self.ensure_built().await?;
        let term = term.to_lowercase();
        let inner = self.inner.read().await;
        let Some(snapshot) = &inner.snapshot else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<&CachedRelease> = snapshot
            .artists
            .iter()
            .flat_map(|a| a.releases.iter())
            .filter(|r| r.title_lower.contains(&term))
            .collect();
        matches.sort_by(|a, b| {
            let a_prefix = a.title_lower.starts_with(&term);
            let b_prefix = b.title_lower.starts_with(&term);
            b_prefix
                .cmp(&a_prefix)
                .then_with(|| a.title_lower.cmp(&b.title_lower))
        });
        Ok(matches.into_iter().take(limit).cloned().collect())
    }

    /// Set the availability of one track. In-flight statuses are layered over
    /// the current snapshot and re-applied after any rebuild; settled ones
    /// update the snapshot but drop the overlay, so the next rebuild derives
    /// the status from disk again. Returns false when the track is not in the
    /// cache.
    pub async fn set_track_status(
        &self,
        artist_id: &str,
        folder_name: &str,
        track_number: u32,
        status: MediaAvailability,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let key = (
            artist_id.to_lowercase(),
            folder_name.to_lowercase(),
            track_number,
        );
        if status.is_in_flight() {
            inner.overlays.insert(key, status);
        } else {
            inner.overlays.remove(&key);
        }
        let Some(snapshot) = &mut inner.snapshot else {
            return false;
        };
        apply_overlay(
            snapshot,
            &artist_id.to_lowercase(),
            &folder_name.to_lowercase(),
            track_number,
            status,
        )
    }

    /// Set the availability of every track in a release.
    pub async fn set_release_status(
        &self,
        artist_id: &str,
        folder_name: &str,
        status: MediaAvailability,
    ) -> bool {
        let numbers = match self.get_release(artist_id, folder_name).await {
            Ok(Some(release)) => release.tracks.iter().map(|t| t.number).collect::<Vec<_>>(),
            _ => return false,
        };
        let mut found = false;
        for number in numbers {
            found |= self
                .set_track_status(artist_id, folder_name, number, status)
                .await;
        }
        found
    }

    async fn ensure_built(&self) -> Result<(), LibraryError> {
        if self.inner.read().await.snapshot.is_some() {
            return Ok(());
        }
        debug!("library cache cold, building first snapshot");
        self.refresh().await
    }

    async fn build_snapshot(&self) -> Result<Snapshot, LibraryError> {
        let descriptors = self.reader.read_artists().await?;
        let mut artists = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let releases = self.reader.read_releases(&descriptor.path).await?;
            let releases = releases
                .into_iter()
                .map(|r| CachedRelease {
                    title_lower: r.title.to_lowercase(),
                    title: r.title,
                    folder_name: r.folder_name,
                    release_group_id: r.release_group_id,
                    artist_id: descriptor.id.clone(),
                    artist_name: descriptor.name.clone(),
                    tracks: r
                        .tracks
                        .into_iter()
                        .map(|t| CachedTrack {
                            status: if t.file_name.is_some() {
                                MediaAvailability::Available
                            } else {
                                MediaAvailability::Missing
                            },
                            title_lower: t.title.to_lowercase(),
                            title: t.title,
                            number: t.number,
                            file_name: t.file_name,
                        })
                        .collect(),
                })
                .collect();
            artists.push(CachedArtist {
                name_lower: descriptor.name.to_lowercase(),
                id: descriptor.id,
                name: descriptor.name,
                path: descriptor.path,
                releases,
            });
        }

        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, artist) in artists.iter().enumerate() {
            by_id.insert(artist.id.to_lowercase(), i);
            by_name.insert(artist.name_lower.clone(), i);
        }
        Ok(Snapshot {
            artists,
            by_id,
            by_name,
        })
    }
}

fn apply_overlay(
    snapshot: &mut Snapshot,
    artist_id_lower: &str,
    folder_lower: &str,
    track_number: u32,
    status: MediaAvailability,
) -> bool {
    let Some(&i) = snapshot.by_id.get(artist_id_lower) else {
        return false;
    };
    let Some(release) = snapshot.artists[i]
        .releases
        .iter_mut()
        .find(|r| r.folder_name.to_lowercase() == folder_lower)
    else {
        return false;
    };
    match release.tracks.iter_mut().find(|t| t.number == track_number) {
        Some(track) => {
            track.status = status;
            true
        }
        None => false,
    }
}
