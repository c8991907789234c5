//! # Fixed Domain Subscriptions
//!
//! The process-lifetime consumers every TrailKit deployment runs:
//!
//! - **Audit trail** on every domain event (highest priority, so the audit
//!   record exists before any other consumer acts)
//! - **Usage aggregation** on kit and expense lifecycle events
//! - **Notifications** on assignment/approval events that carry a user
//!
//! `initialize` is idempotent per bus: the registration happens exactly
//! once, guarded by the bus's initialization flag.

use crate::{expenses, kits, ALL_EVENT_TYPES};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use trailkit_bus::{EventBus, EventEnvelope, EventHandler, SubscribeOptions, SubscriptionFilter};

/// Audit runs before every other consumer.
pub const AUDIT_PRIORITY: i32 = 100;

/// Notifications run before default-priority consumers.
pub const NOTIFICATION_PRIORITY: i32 = 10;

/// Event types feeding usage aggregation.
pub const USAGE_EVENT_TYPES: &[&str] = &[
    kits::KIT_ASSIGNED,
    kits::KIT_RETURNED,
    kits::KIT_RETIRED,
    expenses::EXPENSE_SUBMITTED,
    expenses::EXPENSE_APPROVED,
    expenses::EXPENSE_REJECTED,
];

/// Event types that trigger a user notification.
pub const NOTIFICATION_EVENT_TYPES: &[&str] = &[kits::KIT_ASSIGNED, expenses::EXPENSE_APPROVED];

/// Writes one structured audit record per domain event.
pub struct AuditTrailHandler;

#[async_trait]
impl EventHandler for AuditTrailHandler {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        info!(
            target: "trailkit::audit",
            event_type = %event.event_type,
            event_id = %event.metadata.event_id,
            source = %event.metadata.source,
            organization_id = event.metadata.organization_id.as_deref().unwrap_or("-"),
            user_id = event.metadata.user_id.as_deref().unwrap_or("-"),
            "Domain event"
        );
        Ok(())
    }
}

/// In-memory per-type usage counters.
#[derive(Default)]
pub struct UsageAggregator {
    counts: Mutex<HashMap<String, u64>>,
}

impl UsageAggregator {
    /// Events aggregated so far for a type.
    #[must_use]
    pub fn count(&self, event_type: &str) -> u64 {
        self.counts.lock().get(event_type).copied().unwrap_or(0)
    }

    /// All per-type counts.
    #[must_use]
    pub fn counts(&self) -> HashMap<String, u64> {
        self.counts.lock().clone()
    }
}

#[async_trait]
impl EventHandler for UsageAggregator {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        let mut counts = self.counts.lock();
        *counts.entry(event.event_type.clone()).or_insert(0) += 1;
        debug!(
            event_type = %event.event_type,
            total = counts[&event.event_type],
            "Usage aggregated"
        );
        Ok(())
    }
}

/// Queues a user notification for assignment/approval events.
///
/// The actual delivery channel lives outside this crate; this consumer
/// records the intent.
pub struct NotificationHandler;

#[async_trait]
impl EventHandler for NotificationHandler {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        // The subscription filter guarantees a user id is present.
        info!(
            target: "trailkit::notifications",
            event_type = %event.event_type,
            user_id = event.metadata.user_id.as_deref().unwrap_or("-"),
            "Notification queued"
        );
        Ok(())
    }
}

/// Only notify when the event names a recipient.
fn has_recipient(event: &EventEnvelope) -> bool {
    event.metadata.user_id.is_some()
}

/// Register the fixed domain subscriptions on a bus, exactly once.
///
/// A second call on the same bus is a no-op. `EventBus::graceful_shutdown`
/// clears the guard along with the registry, so a restarted bus can be
/// initialized again.
pub fn initialize(bus: &EventBus) {
    if !bus.begin_initialization() {
        debug!("Domain subscriptions already registered, skipping");
        return;
    }

    let audit: Arc<dyn EventHandler> = Arc::new(AuditTrailHandler);
    for event_type in ALL_EVENT_TYPES {
        bus.subscribe(
            *event_type,
            audit.clone(),
            SubscribeOptions::priority(AUDIT_PRIORITY),
        );
    }

    let aggregator: Arc<dyn EventHandler> = Arc::new(UsageAggregator::default());
    for event_type in USAGE_EVENT_TYPES {
        bus.subscribe(*event_type, aggregator.clone(), SubscribeOptions::default());
    }

    let notifier: Arc<dyn EventHandler> = Arc::new(NotificationHandler);
    let recipient_filter: SubscriptionFilter = Arc::new(has_recipient);
    for event_type in NOTIFICATION_EVENT_TYPES {
        bus.subscribe(
            *event_type,
            notifier.clone(),
            SubscribeOptions {
                priority: NOTIFICATION_PRIORITY,
                filter: Some(recipient_filter.clone()),
                max_retries: 3,
            },
        );
    }

    info!(
        subscriptions = bus.metrics().subscription_count,
        "Domain event subscriptions registered"
    );
}
