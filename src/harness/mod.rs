//! Sequential scenario driver and transcript reporter used to probe promise
//! behavior from the outside, the way a console-logging script would.

mod report;
mod runner;
pub mod scenarios;

pub use report::Reporter;
pub use runner::{Done, TaskRunner};
