//! # TrailKit Bus - In-Process Event Dispatch Core
//!
//! Publish/subscribe bus decoupling domain-state changes (availability,
//! expenses, kit lifecycle, analytics) from their side-effecting consumers
//! (notifications, audit trail, analytics aggregation).
//!
//! ## Dispatch Flow
//!
//! ```text
//! ┌──────────────┐  publish()   ┌─────────────────────────────────┐
//! │ Domain       │ ───────────► │ EventBus                        │
//! │ service      │              │                                 │
//! └──────────────┘              │  circuit breaker gate           │
//!                               │        │                        │
//!                               │  registry lookup/filter/sort    │
//!                               │        │                        │
//!                               │  isolated handler invocation    │
//!                               │        │                        │
//!                               │  ledger / metrics / dead-letter │
//!                               └─────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Isolation:** one failing handler never prevents another from running
//! - **Ordering:** handlers run sequentially in priority-descending order
//! - **Shed load:** an open circuit breaker rejects publishes outright
//! - **Bounded memory:** history and dead-letter buffers evict FIFO
//!
//! This is not a message broker: delivery is single-process, best-effort,
//! at-most-once per handler, with no persistence across restarts.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod circuit_breaker;
pub mod dead_letter;
pub mod envelope;
pub mod error;
pub mod ledger;
pub mod registry;

// Re-export main types
pub use bus::{BusConfig, EventBus, MetricsSnapshot};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use dead_letter::{DeadLetterEntry, DeadLetterQueue};
pub use envelope::{EventEnvelope, EventMetadata, PublishOptions};
pub use error::BusError;
pub use ledger::{EventLedger, HistoryEntry};
pub use registry::{
    handler_fn, EventHandler, SubscribeOptions, Subscription, SubscriptionFilter,
    SubscriptionRegistry,
};

/// Maximum history entries retained before FIFO eviction.
pub const HISTORY_CAPACITY: usize = 1000;

/// Maximum dead-letter entries retained before FIFO eviction.
pub const DEAD_LETTER_CAPACITY: usize = 100;

/// Default number of entries returned by `EventBus::event_history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
