//! Download queue and worker pool.
//!
//! A FIFO of pending releases plus a fixed set of worker slots draining it.
//! One release is owned by at most one slot at a time; enqueueing something
//! already pending or active is a no-op.

mod config;
mod pool;
#[allow(clippy::module_inception)]
mod queue;
mod types;

pub use config::QueueConfig;
pub use pool::{WorkerPool, WorkflowRunner};
pub use queue::DownloadQueue;
pub use types::{DownloadQueueItem, EnqueueOutcome, QueueStatus, SlotSnapshot};
