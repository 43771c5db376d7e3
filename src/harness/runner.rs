use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::info;

use super::Reporter;
use crate::{Deferred, Scheduler};

type TaskCode<T, E> = Box<dyn FnOnce(Done, Deferred<T, E>)>;

struct Task<T, E> {
    label: String,
    code: TaskCode<T, E>,
}

struct RunnerState<T, E> {
    queue: VecDeque<Task<T, E>>,
    // True from the moment a task is scheduled until the queue runs dry.
    busy: bool,
    started: Vec<String>,
    completed: usize,
}

/// Completion signal handed to each task. The next task starts only after
/// [`Done::done`] is called.
pub struct Done {
    signal: Box<dyn FnOnce()>,
}

impl Done {
    pub fn done(self) {
        (self.signal)()
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Done")
    }
}

/// FIFO queue of labelled tasks, run one at a time on the scheduler. Each
/// task gets a fresh [`Deferred`] to exercise.
///
/// ```
/// use promise_deferred::harness::{Reporter, TaskRunner};
/// use promise_deferred::Scheduler;
///
/// let scheduler = Scheduler::new();
/// let reporter = Reporter::new();
/// let runner = TaskRunner::<i32, i32>::new(&scheduler, reporter.clone());
/// runner.push("first", |done, deferred| {
///     deferred.resolve(1);
///     done.done();
/// });
/// runner.push("second", |done, _| done.done());
/// scheduler.run().unwrap();
/// assert_eq!(reporter.lines(), vec!["----- first", "----- second"]);
/// ```
pub struct TaskRunner<T, E> {
    state: Rc<RefCell<RunnerState<T, E>>>,
    scheduler: Scheduler,
    reporter: Reporter,
}

impl<T, E> Clone for TaskRunner<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            scheduler: self.scheduler.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

impl<T: 'static, E: 'static> TaskRunner<T, E> {
    pub fn new(scheduler: &Scheduler, reporter: Reporter) -> Self {
        Self {
            state: Rc::new(RefCell::new(RunnerState {
                queue: VecDeque::new(),
                busy: false,
                started: vec![],
                completed: 0,
            })),
            scheduler: scheduler.clone(),
            reporter,
        }
    }

    pub fn push(
        &self,
        label: impl Into<String>,
        code: impl FnOnce(Done, Deferred<T, E>) + 'static,
    ) {
        let start = {
            let mut state = self.state.borrow_mut();
            state.queue.push_back(Task {
                label: label.into(),
                code: Box::new(code),
            });
            !std::mem::replace(&mut state.busy, true)
        };
        if start {
            self.schedule_next();
        }
    }

    /// Labels of the tasks started so far, in order.
    pub fn started(&self) -> Vec<String> {
        self.state.borrow().started.clone()
    }

    pub fn completed(&self) -> usize {
        self.state.borrow().completed
    }

    pub fn is_idle(&self) -> bool {
        !self.state.borrow().busy
    }

    fn schedule_next(&self) {
        let runner = self.clone();
        self.scheduler.enqueue(move || runner.start_next());
    }

    fn start_next(&self) {
        let task = self.state.borrow_mut().queue.pop_front();
        let Some(task) = task else {
            self.state.borrow_mut().busy = false;
            return;
        };
        info!(label = %task.label, "task started");
        self.reporter.record(format!("----- {}", task.label));
        self.state.borrow_mut().started.push(task.label);

        let runner = self.clone();
        let done = Done {
            signal: Box::new(move || {
                runner.state.borrow_mut().completed += 1;
                runner.schedule_next();
            }),
        };
        (task.code)(done, Deferred::new(&self.scheduler));
    }
}
