//! # Availability Events
//!
//! Member availability windows changing.

use crate::publish_typed;
use serde::{Deserialize, Serialize};
use trailkit_bus::{EventBus, PublishOptions};

/// `metadata.source` for this domain.
pub const SOURCE: &str = "availability";

/// A member's availability changed.
pub const AVAILABILITY_CHANGED: &str = "availability.changed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityChanged {
    pub member_id: String,
    pub organization_id: String,
    /// Window start, Unix epoch milliseconds.
    pub starts_at: u64,
    /// Window end, Unix epoch milliseconds.
    pub ends_at: u64,
    pub available: bool,
}

pub async fn publish_availability_changed(
    bus: &EventBus,
    payload: &AvailabilityChanged,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, AVAILABILITY_CHANGED, SOURCE, payload, options).await
}
