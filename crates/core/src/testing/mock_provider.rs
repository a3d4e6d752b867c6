//! Mock fetch provider for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::provider::{
    CancellationToken, FetchQuery, FetchedFile, FileSender, Provider, ProviderError,
    ProviderResult,
};

enum Behavior {
    /// Search returns one result, fetch delivers the files.
    Deliver,
    /// Search returns nothing.
    Empty,
    /// Search never returns.
    HangSearch,
    /// Search returns one result, fetch blocks until cancelled.
    HangTransfer,
    /// Search returns one result, fetch fails.
    FailTransfer,
}

/// Mock implementation of [`Provider`] with scripted behavior.
pub struct MockProvider {
    name: String,
    behavior: Behavior,
    file_count: u32,
    searches: AtomicUsize,
    fetches: AtomicUsize,
}

impl MockProvider {
    /// Delivers `file_count` files on the first fetch.
    pub fn delivering(name: &str, file_count: u32) -> Self {
        Self::with_behavior(name, Behavior::Deliver, file_count)
    }

    /// Finds nothing.
    pub fn empty(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Empty, 0)
    }

    /// Search hangs until the executor's timeout or cancellation.
    pub fn hanging(name: &str) -> Self {
        Self::with_behavior(name, Behavior::HangSearch, 0)
    }

    /// Transfer blocks until the cancellation token fires.
    pub fn hanging_transfer(name: &str, file_count: u32) -> Self {
        Self::with_behavior(name, Behavior::HangTransfer, file_count)
    }

    /// Transfer always fails.
    pub fn failing_transfer(name: &str) -> Self {
        Self::with_behavior(name, Behavior::FailTransfer, 1)
    }

    fn with_behavior(name: &str, behavior: Behavior, file_count: u32) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            file_count,
            searches: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn files(&self) -> Vec<FetchedFile> {
        (1..=self.file_count)
            .map(|i| FetchedFile {
                remote_ref: format!("{}/file-{i}", self.name),
                local_file_name: format!("{i:02} - Track {i}.flac"),
            })
            .collect()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _query: &FetchQuery) -> Result<Vec<ProviderResult>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Empty => Ok(vec![]),
            Behavior::HangSearch => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            _ => Ok(vec![ProviderResult {
                provider: self.name.clone(),
                remote_ref: format!("{}-ref", self.name),
                title: "result".to_string(),
                file_count: self.file_count,
                reliability: 10,
                queue_position: None,
            }]),
        }
    }

    async fn fetch(
        &self,
        _result: &ProviderResult,
        _dest: &Path,
        token: &CancellationToken,
        files: FileSender,
    ) -> Result<Vec<FetchedFile>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::FailTransfer => Err(ProviderError::Transfer("mock transfer failure".to_string())),
            Behavior::HangTransfer => {
                token.cancelled().await;
                Err(ProviderError::Cancelled)
            }
            _ => {
                let delivered = self.files();
                for file in &delivered {
                    let _ = files.send(file.clone());
                }
                Ok(delivered)
            }
        }
    }
}
