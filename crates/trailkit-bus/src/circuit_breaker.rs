//! # Circuit Breaker
//!
//! Sheds load when consecutive dispatch rounds keep failing, protecting
//! the publishing request path from cascading consumer failures.
//!
//! ```text
//! ┌──────────┐ failures ≥ N ┌──────────┐   timeout    ┌──────────┐
//! │  CLOSED  │ ───────────► │   OPEN   │ ───────────► │HALF-OPEN │
//! │ (normal) │              │ (reject) │              │  (probe) │
//! └──────────┘              └──────────┘              └──────────┘
//!       ▲                         ▲                     │     │
//!       │        success          │       failure       │     │
//!       └─────────────────────────┼─────────────────────┘     │
//!                                 └───────────────────────────┘
//! ```
//!
//! A single successful probe in half-open closes the circuit; a failed
//! probe reopens it immediately and restarts the reset timer.

use crate::error::BusError;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation, publishes pass through.
    Closed,
    /// Publishes are rejected immediately.
    Open,
    /// Probing: the next publish is a trial.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Circuit breaker policy.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed rounds before the circuit opens.
    pub failure_threshold: u32,

    /// Time the circuit stays open before allowing a probe.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

struct CircuitInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker guarding the dispatch round.
///
/// All transitions happen under one mutex so concurrent publishes never
/// lose a failure increment and the open transition is idempotent.
pub struct CircuitBreaker {
    inner: Mutex<CircuitInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a breaker with the given policy.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            config,
        }
    }

    /// Gate one dispatch round.
    ///
    /// Closed and half-open pass. Open passes only once `reset_timeout` has
    /// elapsed since the last failure, transitioning to half-open for the
    /// probe; otherwise the round is rejected.
    ///
    /// # Errors
    ///
    /// `BusError::CircuitOpen` while the circuit is open and the reset
    /// timeout has not yet elapsed.
    pub fn try_acquire(&self) -> Result<(), BusError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner.last_failure.map(|at| at.elapsed());
                match elapsed {
                    Some(elapsed) if elapsed >= self.config.reset_timeout => {
                        info!("Circuit breaker transitioning to half-open");
                        inner.state = CircuitState::HalfOpen;
                        Ok(())
                    }
                    Some(elapsed) => {
                        debug!(
                            remaining_ms =
                                (self.config.reset_timeout - elapsed).as_millis() as u64,
                            "Circuit breaker is open, rejecting publish"
                        );
                        Err(BusError::CircuitOpen)
                    }
                    // Open without a failure time cannot normally happen;
                    // fail closed rather than reject forever.
                    None => Ok(()),
                }
            }
        }
    }

    /// Record a successful dispatch round.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                info!("Circuit breaker closing after successful probe");
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.last_failure = None;
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed dispatch round.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                inner.last_failure = Some(Instant::now());
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        failures = inner.failure_count,
                        threshold = self.config.failure_threshold,
                        timeout_secs = self.config.reset_timeout.as_secs(),
                        "Circuit breaker opening due to failures"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker reopening after probe failure");
                inner.state = CircuitState::Open;
                inner.last_failure = Some(Instant::now());
            }
            CircuitState::Open => {
                // Refresh the timer so the open window extends.
                inner.last_failure = Some(Instant::now());
            }
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Current consecutive failure count.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Force the circuit closed (operator action).
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        info!("Circuit breaker manually reset");
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
