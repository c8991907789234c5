//! # Event Envelope
//!
//! The immutable record handed to every handler in a dispatch round.
//!
//! An envelope is built once per publish with a freshly generated event id
//! and the current timestamp, then passed by reference to every matching
//! handler. Only copies persist after the round (in the history ledger and
//! the dead-letter queue).

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Metadata attached to every published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique id, generated per publish.
    pub event_id: Uuid,

    /// Publish time, Unix epoch milliseconds.
    pub timestamp: u64,

    /// Originating component (stamped by the publisher façade).
    pub source: String,

    /// Correlation id for tracing a flow across events.
    pub correlation_id: Option<String>,

    /// Acting user, when the event was user-initiated.
    pub user_id: Option<String>,

    /// Organization the event belongs to.
    pub organization_id: Option<String>,

    /// Session that originated the event.
    pub session_id: Option<String>,

    /// Free-form tags for filtering and inspection.
    pub tags: Vec<String>,

    /// How many times this event has been re-dispatched.
    ///
    /// The bus never increments this itself; it only compares it against a
    /// subscription's retry budget when routing terminal failures to the
    /// dead-letter queue. See `SubscribeOptions::max_retries`.
    pub retry_count: u32,
}

/// Caller-supplied options for a publish call.
///
/// Everything is optional; `source` defaults to `"unknown"` when no façade
/// stamped it.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub source: Option<String>,
    pub correlation_id: Option<String>,
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub session_id: Option<String>,
    pub tags: Vec<String>,
}

impl PublishOptions {
    /// Options with only the source stamped, the common façade case.
    #[must_use]
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }
}

/// An event flowing through the bus.
///
/// The payload is opaque to the bus; its schema is owned by the publisher
/// façade that built it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Dot-namespaced event type key, e.g. `"kit.assigned"`.
    pub event_type: String,

    /// Opaque domain payload.
    pub payload: serde_json::Value,

    /// Envelope metadata.
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Build a new envelope for a publish call.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        options: PublishOptions,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                timestamp: current_timestamp_ms(),
                source: options.source.unwrap_or_else(|| "unknown".to_string()),
                correlation_id: options.correlation_id,
                user_id: options.user_id,
                organization_id: options.organization_id,
                session_id: options.session_id,
                tags: options.tags,
                retry_count: 0,
            },
        }
    }
}

/// Current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
