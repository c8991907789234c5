//! # TrailKit Test Suite
//!
//! Unified test crate for the event dispatch core.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── dispatch.rs    # Isolation, priority ordering, history bounds
//!     ├── resilience.rs  # Circuit breaker, dead-letter routing
//!     └── lifecycle.rs   # initialize / graceful_shutdown, façades
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p trailkit-tests
//!
//! # By category
//! cargo test -p trailkit-tests integration::dispatch
//! cargo test -p trailkit-tests integration::resilience
//! ```

pub mod integration;
