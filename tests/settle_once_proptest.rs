//! Property tests for settle-once and outcome pass-through.

mod common;

use common::init_test_logging;
use promise_deferred::{Resolution, Scheduler, State};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Attempt {
    Resolve(i32),
    Reject(i32),
}

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    prop_oneof![
        any::<i32>().prop_map(Attempt::Resolve),
        any::<i32>().prop_map(Attempt::Reject),
    ]
}

fn arb_outcome() -> impl Strategy<Value = Result<i32, i32>> {
    prop_oneof![
        any::<i32>().prop_map(Ok::<i32, i32>),
        any::<i32>().prop_map(Err::<i32, i32>),
    ]
}

fn expected_state(first: &Attempt) -> State<i32, i32> {
    match first {
        Attempt::Resolve(v) => State::Fulfilled(*v),
        Attempt::Reject(r) => State::Rejected(*r),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Only the first resolve/reject takes effect, however many follow.
    #[test]
    fn first_settlement_wins(attempts in prop::collection::vec(arb_attempt(), 1..16)) {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, i32>();
        for attempt in &attempts {
            match attempt {
                Attempt::Resolve(v) => deferred.resolve(*v),
                Attempt::Reject(r) => deferred.reject(*r),
            }
            scheduler.run_until_idle().unwrap();
        }
        let snapshot = deferred.promise().inspect();
        let expected = expected_state(&attempts[0]);
        prop_assert_eq!(snapshot.state, expected.kind());
        match expected {
            State::Fulfilled(v) => {
                prop_assert_eq!(snapshot.value, Some(v));
            }
            State::Rejected(r) => {
                prop_assert_eq!(snapshot.reason, Some(r));
            }
            State::Pending => unreachable!(),
        }
    }

    /// A plain-returning `finally` handler never changes the outcome.
    #[test]
    fn finally_preserves_outcome(outcome in arb_outcome(), ignored in any::<u8>()) {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, i32>();
        let cleaned = deferred.promise().finally(move || Ok(Resolution::Value(ignored)));
        deferred.settle(outcome);
        prop_assert_eq!(scheduler.wait(&cleaned), Ok(outcome));
    }

    /// A failing `finally` handler always replaces the outcome.
    #[test]
    fn finally_error_overrides(outcome in arb_outcome(), thrown in any::<i32>()) {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, i32>();
        let cleaned = deferred
            .promise()
            .finally(move || Err::<Resolution<(), i32>, i32>(thrown));
        deferred.settle(outcome);
        prop_assert_eq!(scheduler.wait(&cleaned), Ok(Err(thrown)));
    }

    /// Following a promise settles the outer one with the inner outcome,
    /// whatever the outer producer attempts meanwhile.
    #[test]
    fn following_ignores_producer(
        outcome in arb_outcome(),
        attempts in prop::collection::vec(arb_attempt(), 0..8),
    ) {
        init_test_logging();
        let scheduler = Scheduler::new();
        let outer = scheduler.deferred::<i32, i32>();
        let inner = scheduler.deferred::<i32, i32>();
        outer.follow(inner.promise());
        for attempt in attempts {
            match attempt {
                Attempt::Resolve(v) => outer.resolve(v),
                Attempt::Reject(r) => outer.reject(r),
            }
        }
        prop_assert!(outer.promise().is_pending());
        inner.settle(outcome);
        prop_assert_eq!(scheduler.wait(&outer.promise()), Ok(outcome));
    }
}
