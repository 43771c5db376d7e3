use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use tracing::info;

use super::Done;
use crate::{Promise, Resolution, StateKind};

/// Collects transcript lines. Clones share one transcript.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: impl Into<String>) {
        let line = line.into();
        info!("{line}");
        self.lines.borrow_mut().push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Records `Fulfilled: <value>` or `Rejected: <reason>` once `promise`
    /// settles, then signals `done`.
    pub fn finish<T, E>(&self, done: Done, promise: &Promise<T, E>)
    where
        T: Display + Clone + 'static,
        E: Display + Clone + 'static,
    {
        let reporter = self.clone();
        promise
            .then(
                |value| Ok(Resolution::Value(format!("Fulfilled: {value}"))),
                |reason| Ok(Resolution::Value(format!("Rejected: {reason}"))),
            )
            .then_fulfilled(move |line: String| {
                reporter.record(line);
                done.done();
                Ok(Resolution::Value(()))
            });
    }

    /// Records the current state of `promise`, plus its value or reason.
    /// Without a label the lines are prefixed with `Result`.
    pub fn show_state<T, E>(&self, label: Option<&str>, promise: &Promise<T, E>)
    where
        T: Display + Clone + 'static,
        E: Display + Clone + 'static,
    {
        let prefix = label.unwrap_or("Result");
        let snapshot = promise.inspect();
        self.record(format!("{prefix} state: {}", snapshot.state));
        match (snapshot.state, snapshot.value, snapshot.reason) {
            (StateKind::Fulfilled, Some(value), _) => {
                self.record(format!("{prefix} value: {value}"))
            }
            (StateKind::Rejected, _, Some(reason)) => {
                self.record(format!("{prefix} reason: {reason}"))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scheduler;

    #[test]
    fn test_show_state_lines() {
        let scheduler = Scheduler::new();
        let reporter = Reporter::new();
        let pending = scheduler.deferred::<i32, i32>();
        reporter.show_state(Some("d:"), &pending.promise());
        let rejected = Promise::<i32, i32>::rejected(&scheduler, 20);
        reporter.show_state(None, &rejected);
        assert_eq!(
            reporter.lines(),
            vec!["d: state: pending", "Result state: rejected", "Result reason: 20"]
        );
    }
}
