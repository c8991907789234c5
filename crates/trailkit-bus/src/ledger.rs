//! # History Ledger & Metrics
//!
//! Bounded ring buffer of recently dispatched events plus incremental
//! per-type counters. Appends are O(1) amortized with FIFO eviction;
//! reads clone under a short read lock and never block appends for long.

use crate::envelope::EventMetadata;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// One dispatched event as recorded in the history ring.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Event type key.
    pub event_type: String,

    /// Copy of the payload.
    pub payload: serde_json::Value,

    /// Copy of the metadata.
    pub metadata: EventMetadata,

    /// Completion time of the round, Unix epoch milliseconds.
    pub dispatched_at: u64,

    /// Total handling time of the round in milliseconds.
    pub handling_time_ms: f64,
}

#[derive(Debug, Clone, Default)]
struct TypeStats {
    count: u64,
    avg_handling_time_ms: f64,
    failures: u64,
}

/// Aggregated counters, cloned out for metrics snapshots.
#[derive(Debug, Clone, Default)]
pub struct LedgerAggregate {
    pub total_events: u64,
    pub events_by_type: HashMap<String, u64>,
    pub avg_handling_time_ms_by_type: HashMap<String, f64>,
    pub failure_count_by_type: HashMap<String, u64>,
    pub last_event_time: Option<u64>,
}

struct LedgerInner {
    history: VecDeque<HistoryEntry>,
    total_events: u64,
    stats: HashMap<String, TypeStats>,
    last_event_time: Option<u64>,
}

/// Bounded event history with per-type metrics.
pub struct EventLedger {
    inner: RwLock<LedgerInner>,
    capacity: usize,
}

impl EventLedger {
    /// Create a ledger retaining at most `capacity` history entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                history: VecDeque::with_capacity(capacity),
                total_events: 0,
                stats: HashMap::new(),
                last_event_time: None,
            }),
            capacity,
        }
    }

    /// Record a completed dispatch round.
    ///
    /// Updates the running average incrementally:
    /// `new = (old * n + sample) / (n + 1)`. All historical samples weigh
    /// equally; `n = 0` takes the sample directly.
    pub fn record(&self, entry: HistoryEntry) {
        let mut inner = self.inner.write();

        let stats = inner.stats.entry(entry.event_type.clone()).or_default();
        if stats.count == 0 {
            stats.avg_handling_time_ms = entry.handling_time_ms;
        } else {
            stats.avg_handling_time_ms = (stats.avg_handling_time_ms * stats.count as f64
                + entry.handling_time_ms)
                / (stats.count + 1) as f64;
        }
        stats.count += 1;

        inner.total_events += 1;
        inner.last_event_time = Some(entry.dispatched_at);

        if inner.history.len() >= self.capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(entry);
    }

    /// Count one handler failure against an event type.
    pub fn record_failure(&self, event_type: &str) {
        let mut inner = self.inner.write();
        inner.stats.entry(event_type.to_string()).or_default().failures += 1;
    }

    /// The most recent entries, oldest first, most recent last.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let inner = self.inner.read();
        let skip = inner.history.len().saturating_sub(limit);
        inner.history.iter().skip(skip).cloned().collect()
    }

    /// Number of entries currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().history.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().history.is_empty()
    }

    /// Clone out the aggregated counters.
    #[must_use]
    pub fn aggregate(&self) -> LedgerAggregate {
        let inner = self.inner.read();
        LedgerAggregate {
            total_events: inner.total_events,
            events_by_type: inner
                .stats
                .iter()
                .filter(|(_, s)| s.count > 0)
                .map(|(k, s)| (k.clone(), s.count))
                .collect(),
            avg_handling_time_ms_by_type: inner
                .stats
                .iter()
                .filter(|(_, s)| s.count > 0)
                .map(|(k, s)| (k.clone(), s.avg_handling_time_ms))
                .collect(),
            failure_count_by_type: inner
                .stats
                .iter()
                .filter(|(_, s)| s.failures > 0)
                .map(|(k, s)| (k.clone(), s.failures))
                .collect(),
            last_event_time: inner.last_event_time,
        }
    }

    /// Drop all history entries. Counters are kept: metrics only reset
    /// with the process.
    pub fn clear_history(&self) {
        self.inner.write().history.clear();
    }
}
