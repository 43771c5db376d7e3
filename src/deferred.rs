use std::fmt;

use tracing::debug;

use crate::resolution::{self, Awaitable, Resolution, Settler};
use crate::{Promise, Scheduler};

/// The producer side of a [`Promise`]. Only the deferred may move its promise
/// out of `Pending`, and only the first effective call does so; later calls
/// are ignored without error.
///
/// # Examples
///
/// ```
/// use promise_deferred::{Scheduler, StateKind};
///
/// let scheduler = Scheduler::new();
/// let outer = scheduler.deferred::<&str, &str>();
/// let inner = scheduler.deferred::<&str, &str>();
/// outer.follow(inner.promise());
/// outer.reject("ignored while following");
/// assert_eq!(outer.promise().state_kind(), StateKind::Pending);
///
/// inner.resolve("FFF");
/// assert_eq!(scheduler.wait(&outer.promise()), Ok(Ok("FFF")));
/// ```
pub struct Deferred<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("promise", &self.promise)
            .finish()
    }
}

impl<T, E> Deferred<T, E> {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            promise: Promise::pending(scheduler),
        }
    }

    pub fn promise(&self) -> Promise<T, E> {
        self.promise.clone()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Deferred<T, E> {
    /// Fulfills with a plain value.
    pub fn resolve(&self, value: T) {
        self.resolve_with(Resolution::Value(value));
    }

    /// Resolves with another awaitable, adopting its eventual outcome.
    pub fn follow(&self, awaitable: impl Awaitable<T, E> + 'static) {
        self.resolve_with(Resolution::follow(awaitable));
    }

    pub fn resolve_with(&self, resolution: Resolution<T, E>) {
        resolution::resolve_promise(&self.promise, resolution);
    }

    pub fn reject(&self, reason: E) {
        resolution::reject_promise(&self.promise, reason);
    }

    /// Fulfills or rejects according to `outcome`.
    pub fn settle(&self, outcome: Result<T, E>) {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(reason) => self.reject(reason),
        }
    }

    /// Holds the promise pending until `gate` settles, then settles it with
    /// `outcome`, or with the gate's reason if the gate rejects.
    pub(crate) fn settle_after<G: 'static>(
        &self,
        gate: Box<dyn Awaitable<G, E>>,
        outcome: Result<T, E>,
    ) {
        if !self.promise.begin_following(None) {
            return;
        }
        let settler = Settler::new(self.promise.clone());
        resolution::watch(
            self.promise.scheduler(),
            gate,
            Box::new(move |gate_outcome| settler.settle(gate_outcome.and(outcome))),
        );
    }
}

impl<T, E> Drop for Deferred<T, E> {
    /// An unsettled promise whose producer is gone can never settle.
    fn drop(&mut self) {
        if self.promise.is_open() {
            debug!("deferred dropped while its promise was pending");
            self.promise.abandon();
        }
    }
}
