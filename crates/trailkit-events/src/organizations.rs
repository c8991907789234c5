//! # Organization Events

use crate::publish_typed;
use serde::{Deserialize, Serialize};
use trailkit_bus::{EventBus, PublishOptions};

/// `metadata.source` for this domain.
pub const SOURCE: &str = "organizations";

/// A member joined an organization.
pub const MEMBER_ADDED: &str = "organization.member_added";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAdded {
    pub organization_id: String,
    pub member_id: String,
    pub role: String,
}

pub async fn publish_member_added(
    bus: &EventBus,
    payload: &MemberAdded,
    options: PublishOptions,
) -> bool {
    publish_typed(bus, MEMBER_ADDED, SOURCE, payload, options).await
}
