//! Resolving a promise with a value or with another awaitable.
//!
//! A value fulfills the promise directly. An awaitable puts the promise into
//! the following condition: the producer loses the ability to settle it and
//! the promise takes whatever terminal outcome the awaitable reaches, after
//! unwrapping any awaitables it fulfills with in turn.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::{Promise, Scheduler};

pub type OnFulfilled<T, E> = Box<dyn FnOnce(Resolution<T, E>)>;
pub type OnRejected<E> = Box<dyn FnOnce(E)>;

/// What a handler hands back: a resolution, or `Err` to reject downstream.
pub type HandlerResult<T, E> = Result<Resolution<T, E>, E>;

pub(crate) type Settled<T, E> = Box<dyn FnOnce(Result<T, E>)>;

/// Anything a promise can be resolved with in place of a plain value.
///
/// Implementors call at most one of the two continuations. Fulfilling with
/// [`Resolution::Follow`] hands the waiter yet another awaitable to unwrap.
/// Dropping both continuations without calling either tells the waiter the
/// awaitable will never settle.
pub trait Awaitable<T, E> {
    fn register_continuation(
        self: Box<Self>,
        on_fulfilled: OnFulfilled<T, E>,
        on_rejected: OnRejected<E>,
    );

    /// The promise behind this awaitable, if it is one. A follower inspects
    /// through it.
    fn as_promise(&self) -> Option<Promise<T, E>> {
        None
    }
}

pub enum Resolution<T, E> {
    Value(T),
    Follow(Box<dyn Awaitable<T, E>>),
}

impl<T, E> Resolution<T, E> {
    pub fn follow(awaitable: impl Awaitable<T, E> + 'static) -> Self {
        Resolution::Follow(Box::new(awaitable))
    }

    pub fn is_follow(&self) -> bool {
        matches!(self, Resolution::Follow(_))
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Resolution<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Follow(_) => f.write_str("Follow(..)"),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> From<Promise<T, E>> for Resolution<T, E> {
    fn from(promise: Promise<T, E>) -> Self {
        Resolution::follow(promise)
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Awaitable<T, E> for Promise<T, E> {
    fn register_continuation(
        self: Box<Self>,
        on_fulfilled: OnFulfilled<T, E>,
        on_rejected: OnRejected<E>,
    ) {
        self.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => on_fulfilled(Resolution::Value(value)),
            Err(reason) => on_rejected(reason),
        }));
    }

    fn as_promise(&self) -> Option<Promise<T, E>> {
        Some(self.clone())
    }
}

/// Settles `target` once; abandons it if dropped without settling.
pub(crate) struct Settler<T, E> {
    target: Option<Promise<T, E>>,
}

impl<T, E> Settler<T, E> {
    pub(crate) fn new(target: Promise<T, E>) -> Self {
        Self {
            target: Some(target),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Settler<T, E> {
    pub(crate) fn settle(mut self, outcome: Result<T, E>) {
        if let Some(target) = self.target.take() {
            target.settle(outcome);
        }
    }
}

impl<T, E> Drop for Settler<T, E> {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.abandon();
        }
    }
}

pub(crate) fn resolve_promise<T, E>(promise: &Promise<T, E>, resolution: Resolution<T, E>)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    if !promise.is_open() {
        debug!("resolve ignored: promise already settled or following");
        return;
    }
    match resolution {
        Resolution::Value(value) => {
            promise.settle(Ok(value));
        }
        Resolution::Follow(awaitable) => {
            let followed = awaitable.as_promise();
            if followed.as_ref().is_some_and(|f| f.leads_to(promise)) {
                warn!("resolve ignored: promise would follow itself");
                return;
            }
            promise.begin_following(followed);
            debug!("promise following an awaitable");
            let settler = Settler::new(promise.clone());
            watch(
                promise.scheduler(),
                awaitable,
                Box::new(move |outcome| settler.settle(outcome)),
            );
        }
    }
}

pub(crate) fn reject_promise<T, E>(promise: &Promise<T, E>, reason: E)
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    if !promise.is_open() {
        debug!("reject ignored: promise already settled or following");
        return;
    }
    promise.settle(Err(reason));
}

/// Waits for `awaitable` to reach a terminal outcome, unwrapping nested
/// awaitables, then calls `on_settled` exactly once.
///
/// Registration itself is queued so that a foreign awaitable calling back
/// synchronously still cannot settle anything inside the caller's turn.
pub(crate) fn watch<T: 'static, E: 'static>(
    scheduler: &Scheduler,
    awaitable: Box<dyn Awaitable<T, E>>,
    on_settled: Settled<T, E>,
) {
    let fulfilled_slot = Rc::new(RefCell::new(Some(on_settled)));
    let rejected_slot = fulfilled_slot.clone();
    let next_scheduler = scheduler.clone();
    scheduler.enqueue(move || {
        awaitable.register_continuation(
            Box::new(move |resolution| {
                let Some(on_settled) = fulfilled_slot.borrow_mut().take() else {
                    return;
                };
                match resolution {
                    Resolution::Value(value) => on_settled(Ok(value)),
                    Resolution::Follow(next) => watch(&next_scheduler, next, on_settled),
                }
            }),
            Box::new(move |reason| {
                let on_settled = rejected_slot.borrow_mut().take();
                if let Some(on_settled) = on_settled {
                    on_settled(Err(reason));
                }
            }),
        );
    });
}
