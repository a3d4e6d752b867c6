//! Release acquisition workflow.
//!
//! One workflow run takes a queued release through candidate lookup,
//! scoring, provider fallback and processing, recording every state change
//! in the history tracker and publishing progress events along the way.

mod machine;
mod overrides;
mod types;

pub use machine::AcquisitionWorkflow;
pub use overrides::OverrideStore;
pub use types::{DownloadState, WorkflowError};
