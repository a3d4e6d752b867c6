//! Types for the provider fetch contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::metadata::CatalogTrack;

/// Query handed to a provider's search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchQuery {
    pub artist_name: String,
    pub release_title: String,
    /// Expected recording list of the selected release variant.
    pub expected_tracks: Vec<CatalogTrack>,
}

impl FetchQuery {
    /// Free-text form used by most backends.
    pub fn query_string(&self) -> String {
        format!("{} {}", self.artist_name, self.release_title)
    }

    pub fn expected_file_count(&self) -> u32 {
        self.expected_tracks.len() as u32
    }
}

/// One response a provider's search returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Provider that produced this result.
    pub provider: String,
    /// Opaque provider-specific handle (username+path, NZB id, info hash...).
    pub remote_ref: String,
    /// Result title as advertised by the source.
    pub title: String,
    /// Number of files the source offers.
    pub file_count: u32,
    /// Source reliability as reported by the backend, higher is better.
    #[serde(default)]
    pub reliability: u32,
    /// Position in the remote peer's upload queue, lower is better.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
}

/// A file the provider has finished transferring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedFile {
    /// Remote reference of the source file.
    pub remote_ref: String,
    /// Name the file was stored under locally.
    pub local_file_name: String,
}

/// Errors from a single provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Search backend failure.
    #[error("provider backend error: {0}")]
    Backend(String),

    /// The transfer errored mid-way.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The caller's cancellation signal fired.
    #[error("transfer cancelled")]
    Cancelled,
}

/// Channel on which a provider reports each completed file during a fetch.
pub type FileSender = mpsc::UnboundedSender<FetchedFile>;

/// Observer of fallback execution, used to surface progress.
///
/// All methods have empty defaults; implement only what you need. Callbacks
/// run inline on the fetching task and must not block.
pub trait FetchObserver: Send + Sync {
    fn provider_started(&self, _name: &str, _index: usize, _total: usize) {}
    fn transfer_started(&self, _name: &str, _files_total: u32) {}
    fn file_completed(&self, _file: &FetchedFile) {}
    /// A transfer was abandoned; the executor moves on to the next provider.
    fn transfer_failed(&self, _name: &str, _reason: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFetchObserver;

impl FetchObserver for NullFetchObserver {}

/// One fetch backend: search for candidates, transfer the chosen one.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name for logs, history and events.
    fn name(&self) -> &str;

    /// Search for candidate responses matching the query.
    async fn search(&self, query: &FetchQuery) -> Result<Vec<ProviderResult>, ProviderError>;

    /// Transfer the chosen result into `dest`.
    ///
    /// Each completed file is sent on `files` as it lands; the returned list
    /// is the canonical full set. On cancellation, return
    /// [`ProviderError::Cancelled`] promptly and leave completed files in
    /// place.
    async fn fetch(
        &self,
        result: &ProviderResult,
        dest: &Path,
        token: &CancellationToken,
        files: FileSender,
    ) -> Result<Vec<FetchedFile>, ProviderError>;

    /// Pick the single best response from this provider's results.
    ///
    /// Default ranking: full expected file count first, then reliability,
    /// then queue position; ties keep arrival order.
    fn select_best<'a>(
        &self,
        query: &FetchQuery,
        results: &'a [ProviderResult],
    ) -> Option<&'a ProviderResult> {
        let expected = query.expected_file_count();
        results
            .iter()
            .enumerate()
            .min_by_key(|(i, r)| {
                (
                    u8::from(expected == 0 || r.file_count != expected),
                    std::cmp::Reverse(r.reliability),
                    r.queue_position.unwrap_or(u32::MAX),
                    *i,
                )
            })
            .map(|(_, r)| r)
    }

    /// Remove partial files left behind by an abandoned transfer.
    async fn discard_partial(&self, _result: &ProviderResult, _dest: &Path) {}
}

/// Cancellation signal source, owned by the component that may cancel.
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

/// Cheap cloneable handle observed by in-flight work.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationSource {
    pub fn new() -> (Self, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancellationToken { rx })
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is signalled. Never resolves if the source
    /// is dropped without cancelling, which makes it safe as a select arm.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
