//! # Event Bus
//!
//! The dispatcher: wraps each publish in the circuit breaker, looks up
//! and filters subscriptions, invokes handlers in priority order with
//! failure isolation, and updates the ledger, metrics, and dead-letter
//! queue.
//!
//! Dispatch is strictly sequential in priority-descending order, so
//! completion order equals invocation order. One misbehaving handler is
//! bounded by `BusConfig::handler_timeout` and can neither abort the
//! round nor starve the handlers after it.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::dead_letter::{DeadLetterEntry, DeadLetterQueue};
use crate::envelope::{current_timestamp_ms, EventEnvelope, PublishOptions};
use crate::error::BusError;
use crate::ledger::{EventLedger, HistoryEntry};
use crate::registry::{EventHandler, SubscribeOptions, SubscriptionRegistry};
use crate::{DEAD_LETTER_CAPACITY, HISTORY_CAPACITY};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Bus policy knobs.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Circuit breaker policy for the publish gate.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Upper bound on a single handler invocation. The source design had
    /// no per-handler timeout; this is a deliberate hardening so one
    /// blocking consumer cannot stall the round indefinitely.
    pub handler_timeout: Duration,

    /// History ring capacity.
    pub history_capacity: usize,

    /// Dead-letter ring capacity.
    pub dead_letter_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            circuit_breaker: CircuitBreakerConfig::default(),
            handler_timeout: Duration::from_secs(5),
            history_capacity: HISTORY_CAPACITY,
            dead_letter_capacity: DEAD_LETTER_CAPACITY,
        }
    }
}

/// Point-in-time view of the bus for operators.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_events: u64,
    pub events_by_type: HashMap<String, u64>,
    pub avg_handling_time_ms_by_type: HashMap<String, f64>,
    pub failure_count_by_type: HashMap<String, u64>,
    pub last_event_time: Option<u64>,
    pub circuit_breaker_state: CircuitState,
    pub subscription_count: usize,
    pub dead_letter_queue_size: usize,
}

/// The process-lifetime event bus.
///
/// Constructed explicitly and shared via `Arc` rather than living behind
/// a global; single-instance-per-process is a convention of the caller,
/// not an implicit global.
pub struct EventBus {
    registry: SubscriptionRegistry,
    breaker: CircuitBreaker,
    ledger: EventLedger,
    dead_letters: DeadLetterQueue,
    handler_timeout: Duration,
    initialized: AtomicBool,
}

impl EventBus {
    /// Create a bus with the given policy.
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            breaker: CircuitBreaker::new(config.circuit_breaker),
            ledger: EventLedger::new(config.history_capacity),
            dead_letters: DeadLetterQueue::new(config.dead_letter_capacity),
            handler_timeout: config.handler_timeout,
            initialized: AtomicBool::new(false),
        }
    }

    /// Register a handler for an event type.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        options: SubscribeOptions,
    ) -> Uuid {
        self.registry.subscribe(event_type, handler, options)
    }

    /// Remove a subscription. Returns `false` for a stale or unknown id.
    pub fn unsubscribe(&self, event_type: &str, id: Uuid) -> bool {
        self.registry.unsubscribe(event_type, id)
    }

    /// Publish an event, returning `true` only if every matching handler
    /// succeeded.
    ///
    /// `false` does NOT mean nothing happened: with a partial failure the
    /// succeeding handlers have already run. An open circuit breaker also
    /// yields `false` (with nothing dispatched); use `try_publish` to
    /// distinguish that case.
    pub async fn publish(
        &self,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        options: PublishOptions,
    ) -> bool {
        let event_type = event_type.into();
        match self.try_publish(event_type.clone(), payload, options).await {
            Ok(all_succeeded) => all_succeeded,
            Err(BusError::CircuitOpen) => {
                warn!(event_type = %event_type, "Publish rejected: circuit breaker open");
                false
            }
        }
    }

    /// Publish an event, surfacing an open circuit breaker as an error.
    ///
    /// # Errors
    ///
    /// `BusError::CircuitOpen` when the breaker sheds the publish; no
    /// handler ran and no history entry was recorded.
    pub async fn try_publish(
        &self,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        options: PublishOptions,
    ) -> Result<bool, BusError> {
        let envelope = EventEnvelope::new(event_type, payload, options);

        self.breaker.try_acquire()?;

        let subscriptions = self.registry.matching(&envelope);
        let round_start = Instant::now();
        let mut all_succeeded = true;

        // An event with no listeners is not an error; the round trivially
        // succeeds and is still recorded below.
        for subscription in &subscriptions {
            let started = Instant::now();
            let outcome = timeout(
                self.handler_timeout,
                subscription.handler.handle(&envelope),
            )
            .await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            let error = match outcome {
                Ok(Ok(())) => {
                    debug!(
                        event_type = %envelope.event_type,
                        subscription_id = %subscription.id,
                        elapsed_ms,
                        "Handler completed"
                    );
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(_) => format!(
                    "handler timed out after {}ms",
                    self.handler_timeout.as_millis()
                ),
            };

            all_succeeded = false;
            warn!(
                event_type = %envelope.event_type,
                subscription_id = %subscription.id,
                elapsed_ms,
                error = %error,
                "Handler failed"
            );
            self.ledger.record_failure(&envelope.event_type);

            if envelope.metadata.retry_count >= subscription.max_retries {
                self.dead_letters.push(DeadLetterEntry {
                    event_type: envelope.event_type.clone(),
                    payload: envelope.payload.clone(),
                    metadata: envelope.metadata.clone(),
                    error,
                    attempts: envelope.metadata.retry_count,
                });
            }
        }

        if all_succeeded {
            self.breaker.record_success();
        } else {
            self.breaker.record_failure();
        }

        let handling_time_ms = round_start.elapsed().as_secs_f64() * 1000.0;
        self.ledger.record(HistoryEntry {
            event_type: envelope.event_type.clone(),
            payload: envelope.payload,
            metadata: envelope.metadata,
            dispatched_at: current_timestamp_ms(),
            handling_time_ms,
        });

        Ok(all_succeeded)
    }

    /// Point-in-time metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        let aggregate = self.ledger.aggregate();
        MetricsSnapshot {
            total_events: aggregate.total_events,
            events_by_type: aggregate.events_by_type,
            avg_handling_time_ms_by_type: aggregate.avg_handling_time_ms_by_type,
            failure_count_by_type: aggregate.failure_count_by_type,
            last_event_time: aggregate.last_event_time,
            circuit_breaker_state: self.breaker.state(),
            subscription_count: self.registry.subscription_count(),
            dead_letter_queue_size: self.dead_letters.len(),
        }
    }

    /// The most recent dispatch history, oldest first, most recent last.
    ///
    /// See `DEFAULT_HISTORY_LIMIT` for the conventional operator limit.
    #[must_use]
    pub fn event_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.ledger.recent(limit)
    }

    /// Read-only view of the dead-letter queue.
    #[must_use]
    pub fn dead_letter_queue(&self) -> Vec<DeadLetterEntry> {
        self.dead_letters.entries()
    }

    /// Take every dead-letter entry for operator replay.
    #[must_use]
    pub fn drain_dead_letters(&self) -> Vec<DeadLetterEntry> {
        self.dead_letters.drain()
    }

    /// Event-type keys with at least one active subscription.
    #[must_use]
    pub fn active_subscriptions(&self) -> Vec<String> {
        self.registry.active_event_types()
    }

    /// Current circuit breaker state.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// One-shot guard for registering the fixed domain subscriptions.
    ///
    /// The first caller gets `true` and must perform the registration;
    /// later callers get `false` and skip it.
    pub fn begin_initialization(&self) -> bool {
        self.initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Whether `begin_initialization` has been claimed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Process-exit hook: clears subscriptions, history and dead letters.
    ///
    /// This is not a drain-then-stop; in-flight rounds are not awaited.
    pub fn graceful_shutdown(&self) {
        info!(
            subscriptions = self.registry.subscription_count(),
            dead_letters = self.dead_letters.len(),
            "Event bus shutting down"
        );
        self.registry.clear();
        self.ledger.clear_history();
        self.dead_letters.clear();
        self.initialized.store(false, Ordering::SeqCst);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
