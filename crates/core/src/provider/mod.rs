//! Fetch provider abstraction and fallback execution.
//!
//! A [`Provider`] is one backend capable of finding and transferring a
//! release's files (direct P2P search, indexer-mediated usenet/torrent
//! handoff, ...). The [`FallbackExecutor`] tries a fixed priority-ordered
//! list of providers until one yields files or all are exhausted.

mod config;
mod executor;
mod types;

pub use config::FallbackConfig;
pub use executor::{FallbackError, FallbackExecutor, FetchSuccess};
pub use types::*;
