//! # Kit Lifecycle Events
//!
//! Assignment, return, and retirement of equipment kits.

use crate::publish_typed;
use serde::{Deserialize, Serialize};
use trailkit_bus::{EventBus, PublishOptions};

/// `metadata.source` for this domain.
pub const SOURCE: &str = "kits";

/// A kit was assigned to a member.
pub const KIT_ASSIGNED: &str = "kit.assigned";

/// A kit was returned to inventory.
pub const KIT_RETURNED: &str = "kit.returned";

/// A kit was permanently removed from inventory.
pub const KIT_RETIRED: &str = "kit.retired";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitAssigned {
    pub kit_id: String,
    pub organization_id: String,
    /// Member now holding the kit.
    pub assignee_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitReturned {
    pub kit_id: String,
    pub organization_id: String,
    /// Condition noted at check-in, if any.
    pub condition_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitRetired {
    pub kit_id: String,
    pub organization_id: String,
    pub reason: String,
}

pub async fn publish_kit_assigned(
    bus: &EventBus,
    payload: &KitAssigned,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, KIT_ASSIGNED, SOURCE, payload, options).await
}

pub async fn publish_kit_returned(
    bus: &EventBus,
    payload: &KitReturned,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, KIT_RETURNED, SOURCE, payload, options).await
}

pub async fn publish_kit_retired(
    bus: &EventBus,
    payload: &KitRetired,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, KIT_RETIRED, SOURCE, payload, options).await
}
