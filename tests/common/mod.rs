#![allow(dead_code)]

use std::sync::Once;

use promise_deferred::{Promise, Scheduler};

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

pub fn fulfilled<T, E>(scheduler: &Scheduler, value: T) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    Promise::fulfilled(scheduler, value)
}

pub fn rejected<T, E>(scheduler: &Scheduler, reason: E) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    Promise::rejected(scheduler, reason)
}
