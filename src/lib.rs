//! A settle-once promise paired with its producer, for single-threaded code.
//!
//! A [`Deferred`] settles its [`Promise`] at most once. Continuations attached
//! with [`Promise::then`] or [`Promise::finally`] never run inside the call
//! that settled the promise: they are queued on the [`Scheduler`] that the
//! deferred was created with and run, in attachment order, when the scheduler
//! is driven.
//!
//! # Examples
//!
//! ```
//! use promise_deferred::{Resolution, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let deferred = scheduler.deferred::<i32, String>();
//! let cleaned = deferred
//!     .promise()
//!     .finally(|| Ok(Resolution::Value("FOO")));
//! deferred.reject("20".into());
//! assert_eq!(scheduler.wait(&cleaned), Ok(Err("20".to_string())));
//! ```

mod combinator;
pub mod deferred;
pub mod error;
pub mod harness;
pub mod promise;
pub mod resolution;
pub mod scheduler;
pub mod state;

pub use deferred::Deferred;
pub use error::Error;
pub use promise::Promise;
pub use resolution::{Awaitable, HandlerResult, OnFulfilled, OnRejected, Resolution};
pub use scheduler::{Microtask, Scheduler, SchedulerConfig};
pub use state::{Inspection, State, StateKind};
