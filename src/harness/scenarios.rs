//! Scripted scenarios covering `finally` overrides and resolution with
//! other promises. Each pushes its tasks onto a runner; the transcript ends
//! up in the runner's reporter.

use super::{Reporter, TaskRunner};
use crate::{Promise, Resolution};

pub type Text = String;

/// `finally` handlers that fail, return a plain value, or are left out.
pub fn finally_overrides(runner: &TaskRunner<Text, Text>, reporter: &Reporter) {
    let r = reporter.clone();
    runner.push("done -> die", move |done, d| {
        let cleaned = d
            .promise()
            .finally(|| Err::<Resolution<(), _>, _>("BOOM!".to_string()));
        r.finish(done, &cleaned);
        d.resolve("10".into());
    });

    let r = reporter.clone();
    runner.push("fail -> normal", move |done, d| {
        r.finish(done, &d.promise().finally(|| Ok(Resolution::Value("FOO"))));
        d.reject("20".into());
    });

    let r = reporter.clone();
    runner.push("fail -> no_callback", move |done, d| {
        r.finish(done, &d.promise().forward());
        d.reject("20".into());
    });
}

/// Resolving a deferred with settled and pending promises, including an
/// attempted rejection while the deferred is following.
pub fn resolve_with_promises(runner: &TaskRunner<Text, Text>, reporter: &Reporter) {
    let r = reporter.clone();
    runner.push("normal", move |done, d| {
        d.resolve("AAA".into());
        r.show_state(None, &d.promise());
        done.done();
    });

    let r = reporter.clone();
    runner.push("fulfilled promise", move |done, d| {
        let dd = d.promise().scheduler().deferred::<Text, Text>();
        dd.resolve("BBB".into());
        let given = dd.promise();
        dd.promise().then_fulfilled(move |_| {
            r.record(format!("> given promise state: {}", given.state_kind()));
            d.follow(given);
            r.show_state(None, &d.promise());
            done.done();
            Ok(Resolution::Value(()))
        });
    });

    let r = reporter.clone();
    runner.push("rejected promise", move |done, d| {
        let dd = d.promise().scheduler().deferred::<Text, Text>();
        dd.reject("CCC".into());
        let given = dd.promise();
        dd.promise().then(
            |_| Ok(Resolution::Value(())),
            move |_| {
                r.record(format!("> given promise state: {}", given.state_kind()));
                d.follow(given);
                r.show_state(None, &d.promise());
                done.done();
                Ok(Resolution::Value(()))
            },
        );
    });

    let r = reporter.clone();
    runner.push("pending fulfilled promise", move |done, d| {
        let dd = d.promise().scheduler().deferred::<Text, Text>();
        d.follow(dd.promise());
        r.show_state(Some("d (dd pending):"), &d.promise());
        dd.resolve("DDD".into());
        r.show_state(Some("dd:"), &dd.promise());
        r.show_state(None, &d.promise());
        done.done();
    });

    let r = reporter.clone();
    runner.push("pending rejected promise", move |done, d| {
        let dd = d.promise().scheduler().deferred::<Text, Text>();
        d.follow(dd.promise());
        r.show_state(Some("d (dd pending):"), &d.promise());
        dd.reject("EEE".into());
        r.show_state(Some("dd:"), &dd.promise());
        r.show_state(None, &d.promise());
        done.done();
    });

    let r = reporter.clone();
    runner.push("pending fulfilled, try to reject while pending", move |done, d| {
        let dd = d.promise().scheduler().deferred::<Text, Text>();
        d.follow(dd.promise());
        r.show_state(Some("d (dd pending):"), &d.promise());
        d.reject("HOGEHOGE".into());
        r.show_state(Some("d (tried to reject):"), &d.promise());
        dd.resolve("FFF".into());
        r.show_state(None, &d.promise());
        done.done();
    });
}

/// `finally` handing back promises: a rejected one overrides a fulfilled
/// outcome, a fulfilled one only delays a rejected outcome.
pub fn finally_gates(runner: &TaskRunner<Text, Text>, reporter: &Reporter) {
    let r = reporter.clone();
    runner.push("done -> rejected gate", move |done, d| {
        let scheduler = d.promise().scheduler().clone();
        let cleaned = d.promise().finally(move || {
            Ok(Resolution::<(), Text>::from(Promise::rejected(&scheduler, "R".into())))
        });
        r.finish(done, &cleaned);
        d.resolve("V".into());
    });

    let r = reporter.clone();
    runner.push("fail -> delayed gate", move |done, d| {
        let scheduler = d.promise().scheduler().clone();
        let cleaned = d.promise().finally(move || {
            Ok(Resolution::<Text, Text>::from(scheduler.delay(50, "ignored".into())))
        });
        r.finish(done, &cleaned);
        d.reject("R0".into());
    });
}
