//! # Lifecycle
//!
//! End-to-end flow through the typed façades: initialize, publish from
//! domain services, inspect, shut down.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use trailkit_bus::{EventBus, PublishOptions};
    use trailkit_events::{expenses, initialize, kits};

    #[tokio::test]
    async fn initialized_bus_dispatches_domain_events() {
        let bus = EventBus::default();
        initialize(&bus);

        let assigned = kits::KitAssigned {
            kit_id: "K-1".to_string(),
            organization_id: "org-1".to_string(),
            assignee_id: "u-1".to_string(),
        };
        let options = PublishOptions {
            user_id: Some("u-1".to_string()),
            organization_id: Some("org-1".to_string()),
            ..PublishOptions::default()
        };
        assert!(kits::publish_kit_assigned(&bus, &assigned, options).await);

        let approved = expenses::ExpenseApproved {
            expense_id: "E-1".to_string(),
            organization_id: "org-1".to_string(),
            amount_cents: 4_200,
            approver_id: "u-2".to_string(),
        };
        assert!(expenses::publish_expense_approved(&bus, &approved, PublishOptions::default()).await);

        let metrics = bus.metrics();
        assert_eq!(metrics.total_events, 2);
        assert_eq!(metrics.events_by_type[kits::KIT_ASSIGNED], 1);
        assert_eq!(metrics.events_by_type[expenses::EXPENSE_APPROVED], 1);
        assert!(bus.active_subscriptions().contains(&kits::KIT_ASSIGNED.to_string()));
    }

    #[tokio::test]
    async fn initialize_twice_does_not_double_deliver() {
        let bus = EventBus::default();
        initialize(&bus);
        initialize(&bus);

        let returned = kits::KitReturned {
            kit_id: "K-2".to_string(),
            organization_id: "org-1".to_string(),
            condition_note: Some("scuffed".to_string()),
        };
        assert!(kits::publish_kit_returned(&bus, &returned, PublishOptions::default()).await);

        // One history entry, not two: the second initialize was a no-op
        assert_eq!(bus.metrics().events_by_type[kits::KIT_RETURNED], 1);
    }

    #[tokio::test]
    async fn shutdown_clears_and_allows_reinitialize() {
        let bus = EventBus::default();
        initialize(&bus);
        bus.publish(kits::KIT_ASSIGNED, json!({}), PublishOptions::default()).await;

        bus.graceful_shutdown();

        assert!(bus.active_subscriptions().is_empty());
        assert!(bus.event_history(100).is_empty());
        assert!(bus.dead_letter_queue().is_empty());

        // A publish after shutdown finds no listeners and trivially succeeds
        assert!(bus.publish(kits::KIT_ASSIGNED, json!({}), PublishOptions::default()).await);

        initialize(&bus);
        assert!(!bus.active_subscriptions().is_empty());
    }

    #[tokio::test]
    async fn history_records_facade_metadata() {
        let bus = EventBus::default();
        initialize(&bus);

        let submitted = expenses::ExpenseSubmitted {
            expense_id: "E-9".to_string(),
            organization_id: "org-2".to_string(),
            amount_cents: 9_900,
            category: "fuel".to_string(),
        };
        let options = PublishOptions {
            correlation_id: Some("req-123".to_string()),
            ..PublishOptions::default()
        };
        expenses::publish_expense_submitted(&bus, &submitted, options).await;

        let history = bus.event_history(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].metadata.source, expenses::SOURCE);
        assert_eq!(history[0].metadata.correlation_id.as_deref(), Some("req-123"));
        assert_eq!(history[0].payload["category"], "fuel");
        assert_eq!(history[0].metadata.retry_count, 0);
    }
}
