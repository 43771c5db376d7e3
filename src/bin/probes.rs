//! Replays the promise probe scenarios and prints their transcript.
//!
//! Set `RUST_LOG=promise_deferred=trace` to see settlement and scheduling.

use promise_deferred::harness::{scenarios, Reporter, TaskRunner};
use promise_deferred::{Error, Scheduler, SchedulerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let scheduler = Scheduler::with_config(SchedulerConfig::from_env());
    let reporter = Reporter::new();
    let runner = TaskRunner::new(&scheduler, reporter.clone());

    scenarios::finally_overrides(&runner, &reporter);
    scenarios::resolve_with_promises(&runner, &reporter);
    scenarios::finally_gates(&runner, &reporter);
    let steps = scheduler.run()?;
    tracing::debug!(steps, completed = runner.completed(), "scenarios finished");

    for line in reporter.lines() {
        println!("{line}");
    }
    Ok(())
}
