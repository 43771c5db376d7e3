use thiserror::Error;

/// Errors raised while driving a [`Scheduler`](crate::Scheduler).
///
/// A rejected promise is not an `Error`: rejection is an ordinary outcome
/// carried by the promise itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("scheduler ran {limit} steps without going idle")]
    StepLimitExceeded { limit: usize },
    #[error("no queued work can settle the awaited future")]
    Stalled,
    #[error("deferred was dropped before settling its promise")]
    Abandoned,
}
