//! Event sink that records everything for assertions.

use std::sync::{Mutex, MutexGuard};

use crate::events::{Event, EventSink, ProgressSnapshot};

/// Sink that stores every published event in order.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Only the progress snapshots, in order.
    pub fn progress(&self) -> Vec<ProgressSnapshot> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Event::ProgressUpdated(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: Event) {
        self.lock().push(event);
    }
}
