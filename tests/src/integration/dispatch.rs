//! # Dispatch Semantics
//!
//! Handler isolation, priority ordering, bounded history, and the
//! subscribe/unsubscribe contract, exercised through the public bus
//! surface.

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use trailkit_bus::{
        handler_fn, EventBus, EventEnvelope, EventHandler, PublishOptions, SubscribeOptions,
        SubscriptionFilter,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Handler that appends a label to a shared order log.
    fn recording_handler(log: Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Arc<dyn EventHandler> {
        handler_fn(move |_| {
            let log = log.clone();
            async move {
                log.lock().push(label);
                Ok(())
            }
        })
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> Arc<dyn EventHandler> {
        handler_fn(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn failing_handler() -> Arc<dyn EventHandler> {
        handler_fn(|_| async { Err(anyhow!("consumer bug")) })
    }

    // =========================================================================
    // ISOLATION
    // =========================================================================

    #[tokio::test]
    async fn failing_handler_does_not_prevent_others() {
        crate::integration::init_tracing();
        let bus = EventBus::default();
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));

        bus.subscribe("kit.assigned", counting_handler(before.clone()), SubscribeOptions::priority(10));
        bus.subscribe("kit.assigned", failing_handler(), SubscribeOptions::priority(5));
        bus.subscribe("kit.assigned", counting_handler(after.clone()), SubscribeOptions::priority(1));

        let result = bus.publish("kit.assigned", json!({}), PublishOptions::default()).await;

        // Partial failure: the round reports false, but both healthy
        // handlers ran, one before and one after the failing one.
        assert!(!result);
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);

        let metrics = bus.metrics();
        assert_eq!(metrics.failure_count_by_type["kit.assigned"], 1);
        assert_eq!(metrics.events_by_type["kit.assigned"], 1);
    }

    #[tokio::test]
    async fn outcomes_recorded_independently_across_rounds() {
        let bus = EventBus::default();
        let healthy = Arc::new(AtomicUsize::new(0));
        bus.subscribe("e", failing_handler(), SubscribeOptions::default());
        bus.subscribe("e", counting_handler(healthy.clone()), SubscribeOptions::default());

        for _ in 0..3 {
            bus.publish("e", json!({}), PublishOptions::default()).await;
        }

        assert_eq!(healthy.load(Ordering::SeqCst), 3);
        assert_eq!(bus.metrics().failure_count_by_type["e"], 3);
    }

    // =========================================================================
    // PRIORITY ORDERING
    // =========================================================================

    #[tokio::test]
    async fn handlers_run_in_descending_priority() {
        let bus = EventBus::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        // Registered out of priority order on purpose
        bus.subscribe("e", recording_handler(log.clone(), "mid"), SubscribeOptions::priority(5));
        bus.subscribe("e", recording_handler(log.clone(), "low"), SubscribeOptions::priority(1));
        bus.subscribe("e", recording_handler(log.clone(), "high"), SubscribeOptions::priority(10));

        bus.publish("e", json!({}), PublishOptions::default()).await;

        assert_eq!(*log.lock(), vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn equal_priority_preserves_registration_order() {
        let bus = EventBus::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe("e", recording_handler(log.clone(), "first"), SubscribeOptions::priority(5));
        bus.subscribe("e", recording_handler(log.clone(), "second"), SubscribeOptions::priority(5));
        bus.subscribe("e", recording_handler(log.clone(), "third"), SubscribeOptions::priority(5));

        bus.publish("e", json!({}), PublishOptions::default()).await;

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn scenario_two_priorities_and_metrics() {
        let bus = EventBus::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe("order.created", recording_handler(log.clone(), "h1"), SubscribeOptions::priority(10));
        bus.subscribe("order.created", recording_handler(log.clone(), "h2"), SubscribeOptions::priority(1));

        assert!(bus.publish("order.created", json!({"id": "X"}), PublishOptions::default()).await);

        assert_eq!(*log.lock(), vec!["h1", "h2"]);
        assert_eq!(bus.metrics().events_by_type["order.created"], 1);
    }

    // =========================================================================
    // SUBSCRIPTION CONTRACT
    // =========================================================================

    #[tokio::test]
    async fn unsubscribe_removes_from_future_rounds() {
        let bus = EventBus::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = bus.subscribe("e", counting_handler(counter.clone()), SubscribeOptions::default());

        bus.publish("e", json!({}), PublishOptions::default()).await;
        assert!(bus.unsubscribe("e", id));
        bus.publish("e", json!({}), PublishOptions::default()).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // Stale id on a second call
        assert!(!bus.unsubscribe("e", id));
    }

    #[tokio::test]
    async fn duplicate_subscription_delivers_twice() {
        let bus = EventBus::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(counter.clone());

        bus.subscribe("e", handler.clone(), SubscribeOptions::default());
        bus.subscribe("e", handler, SubscribeOptions::default());

        bus.publish("e", json!({}), PublishOptions::default()).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn filter_limits_delivery() {
        let bus = EventBus::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let filter: SubscriptionFilter = Arc::new(|event: &EventEnvelope| {
            event.payload["amount_cents"].as_u64().unwrap_or(0) >= 10_000
        });

        bus.subscribe(
            "expense.submitted",
            counting_handler(counter.clone()),
            SubscribeOptions {
                filter: Some(filter),
                ..SubscribeOptions::default()
            },
        );

        bus.publish("expense.submitted", json!({"amount_cents": 500}), PublishOptions::default()).await;
        bus.publish("expense.submitted", json!({"amount_cents": 25_000}), PublishOptions::default()).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // Both rounds still count as dispatched events
        assert_eq!(bus.metrics().events_by_type["expense.submitted"], 2);
    }

    // =========================================================================
    // HISTORY BOUNDS
    // =========================================================================

    #[tokio::test]
    async fn history_keeps_most_recent_thousand() {
        let bus = EventBus::default();

        for i in 0..1001u32 {
            bus.publish("e", json!({"seq": i}), PublishOptions::default()).await;
        }

        let history = bus.event_history(1000);
        assert_eq!(history.len(), 1000);
        // Oldest (seq 0) evicted first; most recent last
        assert_eq!(history[0].payload["seq"], 1);
        assert_eq!(history[999].payload["seq"], 1000);
        // Counters are unaffected by eviction
        assert_eq!(bus.metrics().total_events, 1001);
    }

    #[tokio::test]
    async fn history_limit_returns_tail() {
        let bus = EventBus::default();
        for i in 0..10u32 {
            bus.publish("e", json!({"seq": i}), PublishOptions::default()).await;
        }

        let history = bus.event_history(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].payload["seq"], 7);
        assert_eq!(history[2].payload["seq"], 9);
    }
}
