//! `then` and `finally`, plus their one-sided forms.
//!
//! Every combinator returns a fresh promise whose producer lives inside the
//! reaction registered on the source, so the downstream promise can only be
//! settled by that reaction.

use crate::resolution::{HandlerResult, Resolution};
use crate::{Deferred, Promise};

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> {
    /// Chains both outcomes. The handler's result resolves the returned
    /// promise, following it if it is an awaitable; `Err` rejects it.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> HandlerResult<U, E> + 'static,
        R: FnOnce(E) -> HandlerResult<U, E> + 'static,
    {
        self.chain(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value),
            Err(reason) => on_rejected(reason),
        })
    }

    /// `then` without a rejection handler: rejections pass through unchanged.
    pub fn then_fulfilled<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> HandlerResult<U, E> + 'static,
    {
        self.chain(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value),
            Err(reason) => Err(reason),
        })
    }

    /// `then` without a fulfillment handler: values pass through unchanged.
    pub fn catch<R>(&self, on_rejected: R) -> Promise<T, E>
    where
        R: FnOnce(E) -> HandlerResult<T, E> + 'static,
    {
        self.chain(move |outcome| match outcome {
            Ok(value) => Ok(Resolution::Value(value)),
            Err(reason) => on_rejected(reason),
        })
    }

    /// A promise adopting this one's outcome one turn later. This is both
    /// handler-less `then` and handler-less `finally`.
    pub fn forward(&self) -> Promise<T, E> {
        self.chain(|outcome| outcome.map(Resolution::Value))
    }

    /// Runs `handler` with no arguments once this promise settles, either way.
    ///
    /// - `Ok(Resolution::Value(_))`: the original outcome is kept and the
    ///   returned value dropped.
    /// - `Err(reason)`: the returned promise rejects with `reason`.
    /// - `Ok(Resolution::Follow(gate))`: the returned promise stays pending
    ///   until `gate` settles. A fulfilled gate keeps the original outcome; a
    ///   rejected gate replaces it with the gate's reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_deferred::{Resolution, Scheduler};
    ///
    /// let scheduler = Scheduler::new();
    /// let deferred = scheduler.deferred::<i32, &str>();
    /// let cleaned = deferred.promise().finally(|| Err::<Resolution<(), _>, _>("BOOM!"));
    /// deferred.resolve(10);
    /// assert_eq!(scheduler.wait(&cleaned), Ok(Err("BOOM!")));
    /// ```
    pub fn finally<G, H>(&self, handler: H) -> Promise<T, E>
    where
        G: 'static,
        H: FnOnce() -> HandlerResult<G, E> + 'static,
    {
        let next = Deferred::new(self.scheduler());
        let promise = next.promise();
        self.subscribe(Box::new(move |outcome| match handler() {
            Ok(Resolution::Value(_)) => next.settle(outcome),
            Ok(Resolution::Follow(gate)) => next.settle_after(gate, outcome),
            Err(reason) => next.reject(reason),
        }));
        promise
    }

    fn chain<U, F>(&self, reaction: F) -> Promise<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(Result<T, E>) -> HandlerResult<U, E> + 'static,
    {
        let next = Deferred::new(self.scheduler());
        let promise = next.promise();
        self.subscribe(Box::new(move |outcome| match reaction(outcome) {
            Ok(resolution) => next.resolve_with(resolution),
            Err(reason) => next.reject(reason),
        }));
        promise
    }
}
