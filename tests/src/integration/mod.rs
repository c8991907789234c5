//! Cross-crate integration tests for the dispatch core.

pub mod dispatch;
pub mod lifecycle;

/// Install a fmt subscriber once so `RUST_LOG` controls test output.
#[cfg(test)]
pub(crate) fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
