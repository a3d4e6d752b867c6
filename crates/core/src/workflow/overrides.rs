//! Manual candidate overrides.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// User-pinned candidate choices, keyed by queue key.
///
/// When an override is present the workflow fetches exactly that catalog
/// release and skips scoring. Overrides are consumed per run, not per key:
/// they stay in place until explicitly cleared so a re-enqueue retries the
/// same pinned variant.
#[derive(Default)]
pub struct OverrideStore {
    chosen: Mutex<HashMap<String, String>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a catalog release id for a queue key.
    pub fn set(&self, queue_key: &str, external_id: &str) {
        debug!(queue_key, external_id, "candidate override set");
        self.lock()
            .insert(queue_key.to_string(), external_id.to_string());
    }

    /// The pinned release id for a queue key, if any.
    pub fn get(&self, queue_key: &str) -> Option<String> {
        self.lock().get(queue_key).cloned()
    }

    /// Remove a pin. Returns false when none was set.
    pub fn clear(&self, queue_key: &str) -> bool {
        self.lock().remove(queue_key).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.chosen.lock().unwrap_or_else(|e| e.into_inner())
    }
}
