//! # Bus Errors
//!
//! The only condition a publisher can distinguish is an open circuit
//! breaker. Handler errors are swallowed at the dispatch boundary:
//! logged, counted, and routed to the dead-letter queue when the retry
//! budget is exhausted, but never propagated to the publishing caller
//! except through the aggregate boolean result.

use thiserror::Error;

/// Errors surfaced by `EventBus` operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The circuit breaker is open; the publish was rejected without
    /// invoking any handler. Treat as "temporarily unavailable".
    #[error("Circuit breaker is open; publish rejected")]
    CircuitOpen,
}
