//! Callback-based completion of asynchronous operations
//!
//! This module provides the completion callback, which is how a client learns
//! that an asynchronous call has completed. The callback is invoked exactly
//! once by the worker which performed the call. It retrieves the call's result
//! from the operation, stores it, and then sets a completion signal which the
//! client may block on or poll.
//!
//! The callback keeps the operation alive for as long as it exists, so that a
//! client may let go of its own reference to the operation while a call is in
//! flight. The executor, in turn, keeps the callback alive until it has been
//! invoked, so neither can be destroyed under the other's feet.

use crate::error::{AsyncOpError, Result};
use crate::handle::AsyncResult;
use crate::multithread::blocking::CompletionSignal;
use crate::multithread::polling::{self, CompletionPoller, OutcomePublisher};
use crate::operation::AsyncOperation;
use crate::status::Outcome;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, event, warn, Level};


/// Handler notified of the completion of one asynchronous call
pub trait AsyncCallback: Send + Sync {
    /// Called exactly once, by the executor, when the call has completed
    ///
    /// The returned status tells whether the callback itself ran properly. It
    /// says nothing about whether the call succeeded.
    fn invoke(&self, result: AsyncResult) -> Result<()>;
}


/// What a callback retrieved from the operation
#[derive(Clone, Debug)]
struct Completion<T> {
    /// Final outcome of the call
    outcome: Outcome,

    /// Result of the call, only present if it succeeded
    value: Option<T>,
}


/// Completion callback which publishes a call's result to its client
pub struct CompletionCallback<Op: AsyncOperation> {
    /// Operation which the call belongs to, kept alive while the call runs
    operation: Arc<Op>,

    /// Set once the call's result has been retrieved
    signal: CompletionSignal<Completion<Op::Output>>,

    /// Optional lock-free outcome channel for polling clients
    publisher: Option<Mutex<OutcomePublisher>>,

    /// Number of times the callback was invoked
    invocations: AtomicUsize,
}
//
impl<Op: AsyncOperation> CompletionCallback<Op> {
    /// Create a callback for one call to `operation`
    pub fn new(operation: &Arc<Op>) -> Arc<Self> {
        Arc::new(Self::build(operation, None))
    }

    /// Create a callback, along with a poller which observes its outcome
    /// without ever blocking
    pub fn with_poller(operation: &Arc<Op>) -> (Arc<Self>, CompletionPoller) {
        let (publisher, poller) = polling::channel();
        (Arc::new(Self::build(operation, Some(publisher))), poller)
    }

    fn build(operation: &Arc<Op>, publisher: Option<OutcomePublisher>) -> Self {
        CompletionCallback {
            operation: Arc::clone(operation),
            signal: CompletionSignal::new(),
            publisher: publisher.map(Mutex::new),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Operation which this callback serves
    pub fn operation(&self) -> &Arc<Op> {
        &self.operation
    }

    /// Wait up to `timeout` for the call to complete
    ///
    /// Returns `Pending` if the timeout elapsed first, which does not cancel
    /// the call. Once the call has completed, returns its final outcome
    /// immediately, whatever the timeout.
    pub fn wait_for_completion(&self, timeout: Duration) -> Outcome {
        match self.signal.wait_timeout(timeout) {
            Ok(Some(completion)) => completion.outcome,
            Ok(None) => Outcome::Pending,
            Err(e) => Outcome::Error(e),
        }
    }

    /// Check the outcome of the call without waiting for it
    pub fn try_outcome(&self) -> Outcome {
        match self.signal.peek() {
            Ok(Some(completion)) => completion.outcome,
            Ok(None) => Outcome::Pending,
            Err(e) => Outcome::Error(e),
        }
    }

    /// Result of the call
    ///
    /// Only meaningful once `wait_for_completion` has reported a successful
    /// outcome. Before that, or if the call failed, this is the default value
    /// of the operation's output type.
    pub fn value(&self) -> Op::Output {
        self.try_value().unwrap_or_default()
    }

    /// Result of the call, if it has completed successfully
    pub fn try_value(&self) -> Option<Op::Output> {
        self.signal.peek().ok().flatten().and_then(|c| c.value)
    }

    /// Number of times the callback was invoked, normally 0 or 1
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::Acquire)
    }
}
//
impl<Op: AsyncOperation> AsyncCallback for CompletionCallback<Op> {
    fn invoke(&self, result: AsyncResult) -> Result<()> {
        let handle = result.handle();

        // Only the first invocation may touch the stored result
        let previous = self.invocations.fetch_add(1, Ordering::AcqRel);
        if previous > 0 {
            warn!(%handle, invocations = previous + 1,
                  "completion callback invoked more than once");
            return Err(AsyncOpError::ContractViolation(
                "completion callback invoked more than once".into()
            ));
        }

        // Retrieve the call's result. Failures become the stored outcome.
        let retrieved = self.operation.end(&result);
        let completion = Completion {
            outcome: Outcome::from(&retrieved),
            value: retrieved.ok(),
        };
        debug!(%handle, outcome = %completion.outcome, "call completed");

        // Store the result and wake up blocking clients...
        let outcome = completion.outcome.clone();
        if self.signal.set(completion).is_err() {
            return Err(AsyncOpError::ContractViolation(
                "completion signal was already set".into()
            ));
        }
        event!(Level::TRACE, message = "completion signaled", %handle);

        // ...then let polling clients know, once the result is readable
        if let Some(publisher) = &self.publisher {
            match publisher.lock() {
                Ok(mut publisher) => publisher.publish(outcome),
                Err(_) => warn!(%handle, "outcome publisher is poisoned"),
            }
        }
        Ok(())
    }
}
//
impl<Op: AsyncOperation> fmt::Debug for CompletionCallback<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionCallback")
            .field("outcome", &self.try_outcome())
            .field("invocations", &self.invocation_count())
            .finish_non_exhaustive()
    }
}
