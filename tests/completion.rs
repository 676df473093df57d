//! End-to-end tests of the completion protocol on a real thread pool

use crossbeam_channel::{bounded, Sender};
use static_assertions::assert_impl_all;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use threaded_completion::executor::manual::ManualExecutor;
use threaded_completion::{AsyncCallback, AsyncOpError, AsyncOperation,
                          AsyncResult, CompletionCallback, CompletionPoller,
                          Outcome, Runtime, RuntimeConfig, SquareRoot};

assert_impl_all!(CompletionCallback<SquareRoot>: Send, Sync);
assert_impl_all!(SquareRoot: Send, Sync);
assert_impl_all!(AsyncResult: Send, Sync, Clone);
assert_impl_all!(CompletionPoller: Send);
assert_impl_all!(Runtime: Send, Sync);

const LONG_WAIT: Duration = Duration::from_secs(30);


fn runtime(workers: usize) -> Runtime {
    let config = RuntimeConfig::default().with_worker_threads(workers)
                                         .with_queue_capacity(256);
    Runtime::startup(config).unwrap()
}


/// The reference computation goes through the whole protocol
#[test]
fn square_root_of_1_1() {
    let runtime = runtime(2);
    let op = Arc::new(SquareRoot::new(runtime.executor()));
    let callback = CompletionCallback::new(&op);
    op.begin(1.1, Some(callback.clone()), None).unwrap();

    assert_eq!(callback.wait_for_completion(LONG_WAIT), Outcome::Done);
    assert!((callback.value() - 1.0488088481701516).abs() < 1e-12);
    assert_eq!(callback.invocation_count(), 1);
    assert_eq!(op.outstanding_calls(), 0);
    runtime.shutdown();
}

/// A short wait on slow work reports a pending call without cancelling it
#[test]
fn timeout_does_not_cancel() {
    let runtime = runtime(1);
    let op = Arc::new(SquareRoot::new(runtime.executor())
                          .with_delay(Duration::from_millis(200)));
    let callback = CompletionCallback::new(&op);
    op.begin(81.0, Some(callback.clone()), None).unwrap();

    assert_eq!(callback.wait_for_completion(Duration::ZERO), Outcome::Pending);
    assert_eq!(callback.wait_for_completion(Duration::from_millis(1)),
               Outcome::Pending);
    assert_eq!(callback.wait_for_completion(LONG_WAIT), Outcome::Done);
    assert_eq!(callback.value(), 9.0);
}

/// Failed work is reported as such, and leaves no value behind
#[test]
fn failure_outcome() {
    let runtime = runtime(1);
    let op = Arc::new(SquareRoot::new(runtime.executor()));
    let callback = CompletionCallback::new(&op);
    op.begin(-4.0, Some(callback.clone()), None).unwrap();

    let outcome = callback.wait_for_completion(LONG_WAIT);
    assert!(matches!(outcome,
                     Outcome::Error(AsyncOpError::OperationFailed(_))));
    assert_eq!(callback.try_value(), None);
}

/// Many concurrent calls each see their own result
#[test]
fn concurrent_isolation() {
    const CALLS: usize = 64;
    let runtime = runtime(4);
    let op = Arc::new(SquareRoot::new(runtime.executor()));

    let callbacks = (0..CALLS).map(|i| {
        let callback = CompletionCallback::new(&op);
        let input = (i * i) as f64;
        op.begin(input, Some(callback.clone()), None).unwrap();
        callback
    }).collect::<Vec<_>>();

    // Wait from several client threads at once
    let waiters = callbacks.into_iter().enumerate().map(|(i, callback)| {
        thread::spawn(move || {
            assert_eq!(callback.wait_for_completion(LONG_WAIT), Outcome::Done);
            assert_eq!(callback.value(), i as f64);
            assert_eq!(callback.invocation_count(), 1);
        })
    }).collect::<Vec<_>>();
    for waiter in waiters {
        waiter.join().unwrap();
    }
    assert_eq!(op.outstanding_calls(), 0);
}

/// The callback keeps the operation alive after the caller lets go of it
#[test]
fn callback_keeps_operation_alive() {
    let executor = Arc::new(ManualExecutor::new());
    let op = Arc::new(SquareRoot::new(executor.clone()));
    let callback = CompletionCallback::new(&op);
    op.begin(25.0, Some(callback.clone()), None).unwrap();
    let weak_op = Arc::downgrade(&op);
    drop(op);
    assert!(weak_op.upgrade().is_some());

    executor.run_pending();
    assert_eq!(callback.wait_for_completion(Duration::ZERO), Outcome::Done);
    assert_eq!(callback.value(), 5.0);

    drop(callback);
    assert!(weak_op.upgrade().is_none());
}

/// Dropping the caller's callback before completion is harmless
#[test]
fn early_callback_release() {
    let runtime = runtime(1);
    let op = Arc::new(SquareRoot::new(runtime.executor())
                          .with_delay(Duration::from_millis(50)));
    let callback = CompletionCallback::new(&op);
    let (watcher, mut poller) = CompletionCallback::with_poller(&op);
    op.begin(1.0, Some(callback.clone()), None).unwrap();
    op.begin(4.0, Some(watcher.clone()), None).unwrap();
    drop(callback);
    drop(watcher);

    // Draining the runtime runs both callbacks
    runtime.shutdown();
    assert_eq!(*poller.poll(), Outcome::Done);
    assert_eq!(op.outstanding_calls(), 0);
}

/// Calls submitted after shutdown fail right away and never call back
#[test]
fn begin_after_shutdown() {
    let runtime = runtime(1);
    let op = Arc::new(SquareRoot::new(runtime.executor()));
    runtime.shutdown();

    let callback = CompletionCallback::new(&op);
    let result = op.begin(1.0, Some(callback.clone()), None);
    assert!(matches!(result, Err(AsyncOpError::ShutDown)));
    assert_eq!(callback.invocation_count(), 0);
    assert_eq!(callback.try_outcome(), Outcome::Pending);
}

/// Custom callbacks only need to implement one method
#[test]
fn custom_callback() {
    struct Forward(Sender<AsyncResult>);
    impl AsyncCallback for Forward {
        fn invoke(&self, result: AsyncResult) -> threaded_completion::Result<()> {
            self.0.send(result).map_err(|_| {
                AsyncOpError::ContractViolation("receiver is gone".into())
            })
        }
    }

    let runtime = runtime(1);
    let op = Arc::new(SquareRoot::new(runtime.executor()));
    let (sender, receiver) = bounded(1);
    let token = op.begin(49.0, Some(Arc::new(Forward(sender))),
                         Some(Arc::new("tag"))).unwrap();

    let completed = receiver.recv_timeout(LONG_WAIT).unwrap();
    assert_eq!(completed.handle(), token.handle());
    assert_eq!(completed.state_as::<&str>(), Some(&"tag"));
    assert_eq!(op.end(&completed), Ok(7.0));
}
