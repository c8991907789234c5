//! # TrailKit Domain Events
//!
//! Typed publisher façades over the `trailkit-bus` dispatch core.
//!
//! Each domain module defines its dot-namespaced event-type keys, the
//! payload shapes for them, and thin publish functions that stamp
//! `metadata.source` and hand a JSON payload to the bus. The bus itself
//! is payload-agnostic; compile-time payload safety lives here.
//!
//! The `init` module wires the fixed process-lifetime consumers (audit
//! trail, analytics aggregation, notifications) exactly once per bus.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod analytics;
pub mod availability;
pub mod expenses;
pub mod init;
pub mod kits;
pub mod organizations;

pub use init::initialize;

use serde::Serialize;
use tracing::error;
use trailkit_bus::{EventBus, PublishOptions};

/// Serialize a typed payload and publish it with the domain source stamped.
///
/// Serialization failure is a programming error in the payload type; it is
/// logged and reported as a failed publish rather than panicking in the
/// request path.
pub(crate) async fn publish_typed<T: Serialize>(
    bus: &EventBus,
    event_type: &str,
    source: &str,
    payload: &T,
    mut options: PublishOptions,
) -> bool {
    let payload = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(err) => {
            error!(event_type, error = %err, "Failed to serialize event payload");
            return false;
        }
    };
    options.source = Some(source.to_string());
    bus.publish(event_type, payload, options).await
}

/// Every event-type key the domain façades publish.
///
/// The audit trail subscribes to each of these; keep it in sync when a
/// domain module adds a key.
pub const ALL_EVENT_TYPES: &[&str] = &[
    kits::KIT_ASSIGNED,
    kits::KIT_RETURNED,
    kits::KIT_RETIRED,
    expenses::EXPENSE_SUBMITTED,
    expenses::EXPENSE_APPROVED,
    expenses::EXPENSE_REJECTED,
    availability::AVAILABILITY_CHANGED,
    analytics::REPORT_GENERATED,
    organizations::MEMBER_ADDED,
];
