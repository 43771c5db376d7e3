mod common;

#[cfg(test)]
mod tests {
    use super::common::init_test_logging;
    use futures::executor::block_on;
    use promise_deferred::{Error, Resolution, Scheduler, StateKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_promise_resolved_after_delay() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, ()>();
        let promise = deferred.promise();
        scheduler.schedule_timer(1000, move || deferred.resolve(42));

        assert_eq!(scheduler.wait(&promise), Ok(Ok(42)));
        assert_eq!(scheduler.now_ms(), 1000);
        assert_eq!(block_on(promise), Ok(42));
    }

    #[test]
    fn test_then_chain_transforms_values() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, String>();
        let result = deferred
            .promise()
            .then_fulfilled(|v| Ok(Resolution::Value(v + 1)))
            .then_fulfilled(|v| Ok(Resolution::Value(v * 2)))
            .then_fulfilled(|v| Ok(Resolution::Value(format!("{v}"))));
        deferred.resolve(1);
        assert_eq!(scheduler.wait(&result), Ok(Ok("4".to_string())));
    }

    #[test]
    fn test_then_handlers_fire_in_registration_order() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, ()>();
        let order = Rc::new(RefCell::new(vec![]));
        let downstream: Vec<_> = (0..4)
            .map(|tag| {
                let order = order.clone();
                deferred.promise().then_fulfilled(move |v| {
                    order.borrow_mut().push(tag);
                    Ok(Resolution::Value(v + tag))
                })
            })
            .collect();
        deferred.resolve(10);
        scheduler.run_until_idle().unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
        let values: Vec<_> = downstream.iter().map(|p| p.inspect().value).collect();
        assert_eq!(values, vec![Some(10), Some(11), Some(12), Some(13)]);
    }

    #[test]
    fn test_handler_error_rejects_downstream() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, String>();
        let failed = deferred
            .promise()
            .then_fulfilled(|_| Err::<Resolution<i32, _>, _>("thrown".to_string()));
        let recovered = failed.catch(|reason| Ok(Resolution::Value(reason.len() as i32)));
        deferred.resolve(1);
        assert_eq!(scheduler.wait(&failed), Ok(Err("thrown".to_string())));
        assert_eq!(scheduler.wait(&recovered), Ok(Ok(6)));
    }

    #[test]
    fn test_missing_handlers_pass_outcome_through() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let rejected = scheduler.deferred::<i32, &str>();
        let skipped = rejected
            .promise()
            .then_fulfilled(|v| Ok(Resolution::Value(v * 100)))
            .forward();
        rejected.reject("fail");
        assert_eq!(scheduler.wait(&skipped), Ok(Err("fail")));

        let fulfilled = scheduler.deferred::<i32, &str>();
        let kept = fulfilled.promise().catch(|_| Ok(Resolution::Value(-1)));
        fulfilled.resolve(3);
        assert_eq!(scheduler.wait(&kept), Ok(Ok(3)));
    }

    #[test]
    fn test_handler_returning_pending_promise_waits_for_it() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, ()>();
        let inner = scheduler.clone();
        let result = deferred
            .promise()
            .then_fulfilled(move |v| Ok(Resolution::<i32, ()>::from(inner.delay(30, v * 3))));
        deferred.resolve(5);
        scheduler.run_until_idle().unwrap();
        assert!(result.is_pending());
        assert!(result.is_following());
        assert_eq!(scheduler.wait(&result), Ok(Ok(15)));
    }

    #[test]
    fn test_asynchrony_of_continuations() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<&str, ()>();
        let promise = deferred.promise();
        let before = promise.inspect();
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();
        promise.then_fulfilled(move |_| {
            *flag.borrow_mut() = true;
            Ok(Resolution::Value(()))
        });

        deferred.resolve("v");
        assert_eq!(before.state, StateKind::Pending);
        assert_eq!(promise.state_kind(), StateKind::Fulfilled);
        assert!(!*ran.borrow());

        scheduler.run_until_idle().unwrap();
        assert!(*ran.borrow());
    }

    #[test]
    fn test_promise_clones_share_state() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<String, String>();
        let a = deferred.promise();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        deferred.reject("reject!!".into());
        assert_eq!(a.inspect(), b.inspect());
        assert_eq!(block_on(b), Err("reject!!".to_string()));
    }

    #[test]
    fn test_on_rejected_error_rejects_with_new_reason() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, &str>();
        let rethrown = deferred.promise().then(
            |v| Ok(Resolution::Value(v + 1)),
            |_| Err::<Resolution<i32, _>, _>("again"),
        );
        deferred.reject("first");
        assert_eq!(scheduler.wait(&rethrown), Ok(Err("again")));
    }

    #[test]
    fn test_on_rejected_returning_promise_adopts_it() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, &str>();
        let inner = scheduler.clone();
        let recovered = deferred.promise().then(
            |v| Ok(Resolution::Value(v)),
            move |_| Ok(Resolution::<i32, &str>::from(inner.delay(40, 7))),
        );
        deferred.reject("first");
        scheduler.run_until_idle().unwrap();
        assert!(recovered.is_following());
        assert_eq!(scheduler.wait(&recovered), Ok(Ok(7)));
        assert_eq!(scheduler.now_ms(), 40);

        let failing = scheduler.deferred::<i32, &str>();
        let inner = scheduler.clone();
        let adopted = failing.promise().then(
            |v| Ok(Resolution::Value(v)),
            move |_| Ok(Resolution::<i32, &str>::from(inner.delay_reject(10, "late"))),
        );
        failing.reject("first");
        assert_eq!(scheduler.wait(&adopted), Ok(Err("late")));
    }

    #[test]
    fn test_dropped_source_abandons_chained_promises() {
        init_test_logging();
        let scheduler = Scheduler::new();
        let deferred = scheduler.deferred::<i32, ()>();
        let mapped = deferred
            .promise()
            .then_fulfilled(|v| Ok(Resolution::Value(v + 1)));
        let cleaned = mapped.finally(|| Ok(Resolution::Value(())));
        drop(deferred);
        assert!(mapped.is_abandoned());
        assert!(cleaned.is_abandoned());
        assert_eq!(scheduler.wait(&cleaned), Err(Error::Abandoned));
    }
}
