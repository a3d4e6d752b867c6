//! Provider fallback execution.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::metrics;

use super::config::FallbackConfig;
use super::types::{
    CancellationToken, FetchObserver, FetchQuery, FetchedFile, Provider, ProviderError,
};

/// Terminal failure of a whole fallback pass.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// Every configured provider was exhausted without a usable result.
    #[error("no download found after trying {providers_tried} provider(s)")]
    NoDownloadFound { providers_tried: usize },

    /// The caller's cancellation signal fired.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Successful fetch: which provider delivered, and what landed on disk.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub provider_name: String,
    pub provider_index: usize,
    pub files: Vec<FetchedFile>,
}

enum TransferAbort {
    Cancelled,
    Failed(String),
}

/// Tries providers in fixed priority order until one delivers.
///
/// Provider-level errors are swallowed and converted into "try the next
/// provider"; only exhaustion and cancellation surface to the caller. No
/// automatic retry after exhaustion - re-enqueueing is the caller's call.
pub struct FallbackExecutor {
    providers: Vec<Arc<dyn Provider>>,
    config: FallbackConfig,
}

impl FallbackExecutor {
    /// Create an executor over a fixed, priority-ordered provider list.
    pub fn new(providers: Vec<Arc<dyn Provider>>, config: FallbackConfig) -> Self {
        Self { providers, config }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Run one fallback pass for the given query.
    ///
    /// For each provider in order: search (bounded by the search timeout),
    /// pick the provider's best response, transfer it (bounded by the
    /// no-data timeout, which resets on every completed file). Zero usable
    /// candidates, a timeout, or a mid-transfer error all advance to the
    /// next provider; partials from the abandoned attempt are discarded.
    /// Cancellation aborts immediately and leaves completed files in place.
    pub async fn fetch(
        &self,
        query: &FetchQuery,
        dest: &Path,
        token: &CancellationToken,
        observer: &dyn FetchObserver,
    ) -> Result<FetchSuccess, FallbackError> {
        let total = self.providers.len();

        for (index, provider) in self.providers.iter().enumerate() {
            if token.is_cancelled() {
                return Err(FallbackError::Cancelled);
            }

            let name = provider.name().to_string();
            observer.provider_started(&name, index, total);
            debug!(provider = %name, index, total, query = %query.query_string(), "searching provider");

            let results = tokio::select! {
                _ = token.cancelled() => return Err(FallbackError::Cancelled),
                res = timeout(self.config.search_timeout(), provider.search(query)) => {
                    match res {
                        Err(_) => {
                            warn!(provider = %name, "search timed out, trying next provider");
                            metrics::FETCH_ATTEMPTS.with_label_values(&[&name, "search_timeout"]).inc();
                            continue;
                        }
                        Ok(Err(e)) => {
                            warn!(provider = %name, error = %e, "search failed, trying next provider");
                            metrics::FETCH_ATTEMPTS.with_label_values(&[&name, "search_error"]).inc();
                            continue;
                        }
                        Ok(Ok(results)) => results,
                    }
                }
            };

            metrics::SEARCH_RESULTS
                .with_label_values(&[&name])
                .observe(results.len() as f64);

            let Some(best) = provider.select_best(query, &results) else {
                debug!(provider = %name, "no usable candidates, trying next provider");
                metrics::FETCH_ATTEMPTS
                    .with_label_values(&[&name, "no_candidates"])
                    .inc();
                continue;
            };
            let best = best.clone();

            observer.transfer_started(&name, best.file_count);
            debug!(provider = %name, remote_ref = %best.remote_ref, files = best.file_count, "starting transfer");

            let transfer_started = std::time::Instant::now();
            match self
                .run_transfer(provider.as_ref(), &best, dest, token, observer)
                .await
            {
                Ok(files) => {
                    info!(provider = %name, files = files.len(), "fetch complete");
                    metrics::TRANSFER_DURATION
                        .with_label_values(&[&name, "success"])
                        .observe(transfer_started.elapsed().as_secs_f64());
                    metrics::FETCH_ATTEMPTS
                        .with_label_values(&[&name, "success"])
                        .inc();
                    return Ok(FetchSuccess {
                        provider_name: name,
                        provider_index: index,
                        files,
                    });
                }
                Err(TransferAbort::Cancelled) => {
                    // Completed files stay; the processing phase decides
                    // what to keep.
                    metrics::FETCH_ATTEMPTS
                        .with_label_values(&[&name, "cancelled"])
                        .inc();
                    return Err(FallbackError::Cancelled);
                }
                Err(TransferAbort::Failed(reason)) => {
                    warn!(provider = %name, reason = %reason, "transfer abandoned, trying next provider");
                    observer.transfer_failed(&name, &reason);
                    metrics::FETCH_ATTEMPTS
                        .with_label_values(&[&name, "transfer_failed"])
                        .inc();
                    metrics::TRANSFER_DURATION
                        .with_label_values(&[&name, "failed"])
                        .observe(transfer_started.elapsed().as_secs_f64());
                    provider.discard_partial(&best, dest).await;
                    continue;
                }
            }
        }

        Err(FallbackError::NoDownloadFound {
            providers_tried: total,
        })
    }

    /// Drive one provider transfer, enforcing the no-data timeout.
    async fn run_transfer(
        &self,
        provider: &dyn Provider,
        result: &super::types::ProviderResult,
        dest: &Path,
        token: &CancellationToken,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<FetchedFile>, TransferAbort> {
        let (tx, mut rx) = mpsc::unbounded_channel::<FetchedFile>();
        let fetch_fut = provider.fetch(result, dest, token, tx);
        tokio::pin!(fetch_fut);

        let mut rx_open = true;
        loop {
            let idle = tokio::time::sleep(self.config.no_data_timeout());
            tokio::pin!(idle);

            tokio::select! {
                res = &mut fetch_fut => {
                    // Drain late progress reports before returning
                    while let Ok(file) = rx.try_recv() {
                        observer.file_completed(&file);
                    }
                    return match res {
                        Ok(files) => Ok(files),
                        Err(ProviderError::Cancelled) => Err(TransferAbort::Cancelled),
                        Err(e) => Err(TransferAbort::Failed(e.to_string())),
                    };
                }
                maybe_file = rx.recv(), if rx_open => {
                    match maybe_file {
                        Some(file) => observer.file_completed(&file),
                        None => rx_open = false,
                    }
                    // Any progress resets the no-data timer (fresh sleep
                    // next iteration)
                }
                _ = token.cancelled() => {
                    return Err(TransferAbort::Cancelled);
                }
                _ = &mut idle => {
                    return Err(TransferAbort::Failed(format!(
                        "no data received for {}s",
                        self.config.no_data_timeout_secs
                    )));
                }
            }
        }
    }
}
