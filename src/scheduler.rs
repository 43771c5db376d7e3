//! Single-threaded cooperative scheduler.
//!
//! Every continuation a promise triggers is queued here instead of running
//! inside the call that settled the promise. The queue is an injected handle
//! rather than ambient global state, so a test can step it deterministically.
//!
//! Time is virtual: timers never sleep, the clock jumps to the next due timer
//! once the microtask queue has drained.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::task::noop_waker;
use tracing::trace;

use crate::{Deferred, Error, Promise};

pub type Microtask = Box<dyn FnOnce()>;

/// Default ceiling for steps taken by one drive of the queue.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Environment variable read by [`SchedulerConfig::from_env`].
pub const STEP_LIMIT_ENV: &str = "PROMISE_STEP_LIMIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum steps per `run_until_idle`/`block_on`; `None` is unlimited.
    pub step_limit: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_limit: Some(DEFAULT_STEP_LIMIT),
        }
    }
}

impl SchedulerConfig {
    pub fn unlimited() -> Self {
        Self { step_limit: None }
    }

    /// Reads `PROMISE_STEP_LIMIT`. `0` or `none` disables the limit; a missing
    /// or unparsable value keeps the default.
    pub fn from_env() -> Self {
        match std::env::var(STEP_LIMIT_ENV) {
            Ok(raw) => Self::parse_limit(&raw),
            Err(_) => Self::default(),
        }
    }

    fn parse_limit(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("none") {
            return Self::unlimited();
        }
        match raw.parse::<usize>() {
            Ok(0) => Self::unlimited(),
            Ok(limit) => Self {
                step_limit: Some(limit),
            },
            Err(_) => Self::default(),
        }
    }
}

struct TimerTask {
    id: u64,
    due_at: u64,
    callback: Microtask,
}

#[derive(Default)]
struct EventLoop {
    now_ms: u64,
    next_timer_id: u64,
    microtasks: VecDeque<Microtask>,
    timers: Vec<TimerTask>,
}

impl EventLoop {
    fn next_due_time(&self) -> Option<u64> {
        self.timers.iter().map(|timer| timer.due_at).min()
    }

    /// Moves every timer due at `now_ms` onto the microtask queue, earliest
    /// deadline first and in scheduling order among equal deadlines.
    fn release_due_timers(&mut self) -> usize {
        let now = self.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|timer| timer.due_at <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.due_at, timer.id));
        let released = due.len();
        self.microtasks
            .extend(due.into_iter().map(|timer| timer.callback));
        released
    }
}

/// Cloneable handle to a FIFO continuation queue and its virtual clock.
#[derive(Clone, Default)]
pub struct Scheduler {
    event_loop: Rc<RefCell<EventLoop>>,
    config: SchedulerConfig,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event_loop = self.event_loop.borrow();
        f.debug_struct("Scheduler")
            .field("now_ms", &event_loop.now_ms)
            .field("microtasks", &event_loop.microtasks.len())
            .field("timers", &event_loop.timers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            event_loop: Rc::default(),
            config,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Creates a pending promise paired with its producer.
    pub fn deferred<T, E>(&self) -> Deferred<T, E> {
        Deferred::new(self)
    }

    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.event_loop
            .borrow_mut()
            .microtasks
            .push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.event_loop.borrow().microtasks.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.event_loop.borrow().timers.len()
    }

    /// Runs the oldest queued microtask. Returns `false` when the queue is empty.
    pub fn step(&self) -> bool {
        // The borrow must end before the task runs: tasks enqueue more work.
        let task = self.event_loop.borrow_mut().microtasks.pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Drains the microtask queue, including work queued while draining.
    pub fn run_until_idle(&self) -> Result<usize, Error> {
        let mut steps = 0;
        loop {
            if let Some(limit) = self.config.step_limit {
                if steps >= limit && self.pending_tasks() > 0 {
                    return Err(Error::StepLimitExceeded { limit });
                }
            }
            if !self.step() {
                return Ok(steps);
            }
            steps += 1;
        }
    }

    /// Drains microtasks and fires timers until neither has work left.
    pub fn run(&self) -> Result<usize, Error> {
        let mut steps = self.run_until_idle()?;
        while self.advance_to_next_timer() {
            steps += self.run_until_idle()?;
        }
        Ok(steps)
    }

    pub fn now_ms(&self) -> u64 {
        self.event_loop.borrow().now_ms
    }

    /// Queues `callback` to run once the virtual clock reaches `now + delay_ms`.
    pub fn schedule_timer(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> u64 {
        let mut event_loop = self.event_loop.borrow_mut();
        let id = event_loop.next_timer_id;
        event_loop.next_timer_id += 1;
        let due_at = event_loop.now_ms.saturating_add(delay_ms);
        event_loop.timers.push(TimerTask {
            id,
            due_at,
            callback: Box::new(callback),
        });
        trace!(id, delay_ms, due_at, "timer scheduled");
        id
    }

    /// Jumps the clock to the earliest timer and queues every timer due by
    /// then. Returns `false` when no timer is waiting.
    pub fn advance_to_next_timer(&self) -> bool {
        let mut event_loop = self.event_loop.borrow_mut();
        let Some(next_due) = event_loop.next_due_time() else {
            return false;
        };
        event_loop.now_ms = event_loop.now_ms.max(next_due);
        let released = event_loop.release_due_timers();
        trace!(now_ms = event_loop.now_ms, released, "timers released");
        true
    }

    /// A promise fulfilled with `value` once `ms` of virtual time elapse.
    pub fn delay<T, E>(&self, ms: u64, value: T) -> Promise<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let deferred = self.deferred::<T, E>();
        let promise = deferred.promise();
        self.schedule_timer(ms, move || deferred.resolve(value));
        promise
    }

    /// A promise rejected with `reason` once `ms` of virtual time elapse.
    pub fn delay_reject<T, E>(&self, ms: u64, reason: E) -> Promise<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let deferred = self.deferred::<T, E>();
        let promise = deferred.promise();
        self.schedule_timer(ms, move || deferred.reject(reason));
        promise
    }

    /// Polls `future` to completion, stepping microtasks and timers in between.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, Error> {
        let mut future = pin!(future);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut steps = 0;
        loop {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return Ok(output);
            }
            if let Some(limit) = self.config.step_limit {
                if steps >= limit {
                    return Err(Error::StepLimitExceeded { limit });
                }
            }
            if !self.step() && !self.advance_to_next_timer() {
                return Err(Error::Stalled);
            }
            steps += 1;
        }
    }

    /// Drives the queue until `promise` settles and returns its outcome.
    pub fn wait<T, E>(&self, promise: &Promise<T, E>) -> Result<Result<T, E>, Error>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        match self.block_on(promise.clone()) {
            Err(Error::Stalled) if promise.is_abandoned() => Err(Error::Abandoned),
            other => other,
        }
    }
}
