//! # Subscription Registry
//!
//! Maps an event-type key to the ordered set of subscriptions for it.
//!
//! Duplicate registrations of the same handler are allowed and create
//! independent entries; double delivery is an intentional idempotence
//! testing surface for consumers, not a bug to dedupe here.

use crate::envelope::{current_timestamp_ms, EventEnvelope};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A consumer of events.
///
/// Handlers may perform I/O and must be assumed to block or fail; the
/// dispatcher isolates them from each other and bounds their runtime.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event. An `Err` counts against the subscription's retry
    /// budget; it never reaches the publishing caller.
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(EventEnvelope) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        (self.0)(event.clone()).await
    }
}

/// Wrap an async closure as a shareable `EventHandler`.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Predicate over payload + metadata; a subscription only receives events
/// its filter accepts.
pub type SubscriptionFilter = Arc<dyn Fn(&EventEnvelope) -> bool + Send + Sync>;

/// Options for `subscribe`.
#[derive(Clone)]
pub struct SubscribeOptions {
    /// Higher priority runs first within a dispatch round.
    pub priority: i32,

    /// Optional predicate; `None` accepts everything.
    pub filter: Option<SubscriptionFilter>,

    /// Retry budget compared against `metadata.retry_count` when a handler
    /// fails. The bus does not re-publish on its own, so with the default
    /// budget of 3 a failed event is logged and counted but only parked in
    /// the dead-letter queue once its `retry_count` (managed by whoever
    /// re-publishes) has reached this value. Set 0 to dead-letter on the
    /// first failure.
    pub max_retries: u32,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            priority: 0,
            filter: None,
            max_retries: 3,
        }
    }
}

impl SubscribeOptions {
    /// Options with only the priority set.
    #[must_use]
    pub fn priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }
}

/// A registered consumer binding, owned exclusively by the registry.
pub struct Subscription {
    /// Unique id, minted at subscribe time. Handlers cannot be compared
    /// for identity, so this id is the sole unsubscribe token.
    pub id: Uuid,

    /// Event type this subscription listens to.
    pub event_type: String,

    /// The consumer.
    pub handler: Arc<dyn EventHandler>,

    /// Dispatch priority, higher first.
    pub priority: i32,

    /// Optional event predicate.
    pub filter: Option<SubscriptionFilter>,

    /// Retry budget for dead-letter routing.
    pub max_retries: u32,

    /// Registration time, Unix epoch milliseconds.
    pub created_at: u64,
}

/// Registry of subscriptions keyed by event type.
///
/// Insertion order within a key is preserved and acts as the tiebreaker
/// for equal priorities.
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<HashMap<String, Vec<Arc<Subscription>>>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event type.
    ///
    /// Returns the subscription id used for `unsubscribe`.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        options: SubscribeOptions,
    ) -> Uuid {
        let event_type = event_type.into();
        let subscription = Arc::new(Subscription {
            id: Uuid::new_v4(),
            event_type: event_type.clone(),
            handler,
            priority: options.priority,
            filter: options.filter,
            max_retries: options.max_retries,
            created_at: current_timestamp_ms(),
        });
        let id = subscription.id;

        let mut inner = self.inner.write();
        inner.entry(event_type.clone()).or_default().push(subscription);

        debug!(event_type = %event_type, subscription_id = %id, "Subscription created");
        id
    }

    /// Remove a subscription by id.
    ///
    /// Deletes the event-type key when its list becomes empty. Returns
    /// `false` if the id was not found under that type.
    pub fn unsubscribe(&self, event_type: &str, id: Uuid) -> bool {
        let mut inner = self.inner.write();
        let Some(subs) = inner.get_mut(event_type) else {
            return false;
        };

        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() < before;

        if subs.is_empty() {
            inner.remove(event_type);
        }
        if removed {
            debug!(event_type = %event_type, subscription_id = %id, "Subscription removed");
        }
        removed
    }

    /// Subscriptions that should receive the given event, in dispatch order.
    ///
    /// Applies filters, then stable-sorts by priority descending so that
    /// equal priorities keep registration order.
    #[must_use]
    pub fn matching(&self, event: &EventEnvelope) -> Vec<Arc<Subscription>> {
        let inner = self.inner.read();
        let Some(subs) = inner.get(&event.event_type) else {
            return Vec::new();
        };

        let mut matched: Vec<Arc<Subscription>> = subs
            .iter()
            .filter(|s| s.filter.as_ref().is_none_or(|f| f(event)))
            .cloned()
            .collect();
        drop(inner);

        matched.sort_by(|a, b| b.priority.cmp(&a.priority));
        matched
    }

    /// Event-type keys with at least one active subscription.
    #[must_use]
    pub fn active_event_types(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut types: Vec<String> = inner.keys().cloned().collect();
        types.sort();
        types
    }

    /// Total number of registered subscriptions across all types.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.read().values().map(Vec::len).sum()
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}
