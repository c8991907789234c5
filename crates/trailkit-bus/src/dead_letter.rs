//! # Dead-Letter Queue
//!
//! Bounded append log of events whose handler permanently failed (retry
//! budget exhausted). The core provides no automatic replay; replay is an
//! operator action consuming `drain`.

use crate::envelope::EventMetadata;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

/// An event parked after a terminal handler failure.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetterEntry {
    /// Event type key.
    pub event_type: String,

    /// Copy of the payload.
    pub payload: serde_json::Value,

    /// Copy of the metadata at failure time.
    pub metadata: EventMetadata,

    /// Rendered handler error.
    pub error: String,

    /// Dispatch attempts consumed when the event was parked.
    pub attempts: u32,
}

/// Bounded FIFO buffer of dead-lettered events.
pub struct DeadLetterQueue {
    entries: Mutex<VecDeque<DeadLetterEntry>>,
    capacity: usize,
}

impl DeadLetterQueue {
    /// Create a queue retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Park an event, evicting the oldest entry past capacity.
    pub fn push(&self, entry: DeadLetterEntry) {
        warn!(
            event_type = %entry.event_type,
            event_id = %entry.metadata.event_id,
            attempts = entry.attempts,
            error = %entry.error,
            "Event routed to dead-letter queue"
        );

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Read-only copy of the parked entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Take every parked entry, leaving the queue empty.
    #[must_use]
    pub fn drain(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().drain(..).collect()
    }

    /// Number of parked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every parked entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
