use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::{debug, trace};

use crate::state::{Inspection, State, StateKind};
use crate::Scheduler;

/// Continuation run on the scheduler once the promise settles.
pub(crate) type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

/// The read side of a [`Deferred`](crate::Deferred). Any number of holders
/// may keep a clone; all of them observe the same settlement.
///
/// # Examples
///
/// ```
/// use promise_deferred::{Resolution, Scheduler, StateKind};
///
/// let scheduler = Scheduler::new();
/// let deferred = scheduler.deferred::<i32, String>();
/// let doubled = deferred
///     .promise()
///     .then_fulfilled(|v| Ok(Resolution::Value(v * 2)));
/// deferred.resolve(21);
/// assert_eq!(doubled.state_kind(), StateKind::Pending);
/// assert_eq!(scheduler.wait(&doubled), Ok(Ok(42)));
/// ```
pub struct Promise<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
    scheduler: Scheduler,
}

struct Inner<T, E> {
    state: State<T, E>,
    // Set while the promise waits on an awaitable it was resolved with.
    following: bool,
    // The promise being followed, when the awaitable is one. Inspection
    // reads through it until this promise settles.
    followed: Option<Promise<T, E>>,
    abandoned: bool,
    reactions: Vec<Reaction<T, E>>,
    wakers: Vec<Waker>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("state", &inner.state.kind())
            .field("following", &inner.following)
            .field("reactions", &inner.reactions.len())
            .finish()
    }
}

impl<T, E> Promise<T, E> {
    pub(crate) fn pending(scheduler: &Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::Pending,
                following: false,
                followed: None,
                abandoned: false,
                reactions: vec![],
                wakers: vec![],
            })),
            scheduler: scheduler.clone(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Current state. A promise following another promise reports the
    /// followed promise's state, even before its own continuation has run.
    pub fn state_kind(&self) -> StateKind {
        match self.followed() {
            Some(followed) => followed.state_kind(),
            None => self.inner.borrow().state.kind(),
        }
    }

    fn followed(&self) -> Option<Promise<T, E>> {
        self.inner.borrow().followed.clone()
    }

    /// Whether following `self` leads, possibly through other followed
    /// promises, to `target`.
    pub(crate) fn leads_to(&self, target: &Self) -> bool {
        let mut current = Some(self.clone());
        while let Some(promise) = current {
            if promise.ptr_eq(target) {
                return true;
            }
            current = promise.followed();
        }
        false
    }

    pub fn is_pending(&self) -> bool {
        self.state_kind() == StateKind::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state_kind() == StateKind::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.state_kind() == StateKind::Rejected
    }

    /// Pending and waiting on another awaitable; its producer can no longer
    /// settle it directly.
    pub fn is_following(&self) -> bool {
        self.inner.borrow().following
    }

    /// Whether the paired producer was dropped before settling.
    pub fn is_abandoned(&self) -> bool {
        self.inner.borrow().abandoned
    }

    /// Whether a producer call may still settle this promise.
    pub(crate) fn is_open(&self) -> bool {
        let inner = self.inner.borrow();
        inner.state.is_pending() && !inner.following
    }

    /// Enters the following condition. Returns `false` if already closed.
    pub(crate) fn begin_following(&self, followed: Option<Promise<T, E>>) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.state.is_pending() || inner.following {
            return false;
        }
        inner.following = true;
        inner.followed = followed;
        true
    }

    /// Marks a pending promise as never settling. Its reactions are dropped,
    /// which in turn abandons every promise that could only be settled by
    /// them.
    pub(crate) fn abandon(&self) {
        let (reactions, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_pending() || inner.abandoned {
                return;
            }
            inner.abandoned = true;
            (
                std::mem::take(&mut inner.reactions),
                std::mem::take(&mut inner.wakers),
            )
        };
        debug!(dropped = reactions.len(), "promise abandoned");
        drop(reactions);
        for waker in wakers {
            waker.wake();
        }
    }

    /// Same underlying promise.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Promise<T, E> {
    /// An already fulfilled promise.
    pub fn fulfilled(scheduler: &Scheduler, value: T) -> Self {
        let promise = Self::pending(scheduler);
        promise.settle(Ok(value));
        promise
    }

    /// An already rejected promise.
    pub fn rejected(scheduler: &Scheduler, reason: E) -> Self {
        let promise = Self::pending(scheduler);
        promise.settle(Err(reason));
        promise
    }

    pub fn inspect(&self) -> Inspection<T, E> {
        match self.followed() {
            Some(followed) => followed.inspect(),
            None => Inspection::from(&self.inner.borrow().state),
        }
    }

    /// Moves the promise out of `Pending` and queues its reactions in
    /// registration order. A settled promise is left untouched.
    pub(crate) fn settle(&self, outcome: Result<T, E>) -> bool {
        let (reactions, wakers) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_pending() {
                debug!("settle ignored: promise already settled");
                return false;
            }
            inner.state = State::from(outcome.clone());
            inner.following = false;
            inner.followed = None;
            (
                std::mem::take(&mut inner.reactions),
                std::mem::take(&mut inner.wakers),
            )
        };
        let kind = if outcome.is_ok() {
            StateKind::Fulfilled
        } else {
            StateKind::Rejected
        };
        trace!(state = %kind, reactions = reactions.len(), "promise settled");
        for reaction in reactions {
            let outcome = outcome.clone();
            self.scheduler.enqueue(move || reaction(outcome));
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Registers a continuation. On a settled promise it is queued at once;
    /// on an abandoned one it is dropped, since it could never run.
    pub(crate) fn subscribe(&self, reaction: Reaction<T, E>) {
        let (settled, abandoned) = {
            let inner = self.inner.borrow();
            (inner.state.outcome(), inner.abandoned)
        };
        match settled {
            Some(outcome) => self.scheduler.enqueue(move || reaction(outcome)),
            None if abandoned => drop(reaction),
            None => self.inner.borrow_mut().reactions.push(reaction),
        }
    }
}

impl<T: Clone, E: Clone> Future for Promise<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        match inner.state.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
