//! Square root computation, as an asynchronous operation
//!
//! This is a stand-in for any unit of work that is worth running off the
//! caller's thread. Negative and NaN inputs make the work fail, which gives
//! callers an easy way to exercise the failure path of the completion
//! protocol. An artificial delay can also be configured, to simulate slow work.

use crate::error::{AsyncOpError, Result};
use crate::executor::Executor;
use crate::handle::{AsyncResult, HandleTable, OpaqueState};
use crate::multithread::callback::AsyncCallback;
use crate::operation::AsyncOperation;
use crate::server::AsyncOpServer;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, event, Level};


/// Asynchronous square root operation
pub struct SquareRoot {
    /// Executor which runs the computations
    executor: Arc<dyn Executor>,

    /// Calls which have been started but whose result was not retrieved yet
    calls: Arc<HandleTable<f64>>,

    /// Simulated duration of each computation
    delay: Duration,
}
//
impl SquareRoot {
    /// Create an operation which runs its computations on `executor`
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        SquareRoot {
            executor,
            calls: Arc::new(HandleTable::new()),
            delay: Duration::ZERO,
        }
    }

    /// Make every computation take at least `delay`
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls whose result has not been retrieved yet
    pub fn outstanding_calls(&self) -> usize {
        self.calls.len()
    }
}
//
impl AsyncOperation for SquareRoot {
    type Input = f64;
    type Output = f64;

    fn begin(&self,
             input: f64,
             callback: Option<Arc<dyn AsyncCallback>>,
             state: Option<OpaqueState>) -> Result<AsyncResult> {
        let callback = callback.ok_or_else(|| {
            AsyncOpError::InvalidArgument("a completion callback is required".into())
        })?;

        // Register the call, then build the server which will complete it...
        let handle = self.calls.register();
        let token = AsyncResult::new(handle, state);
        let server = AsyncOpServer::new(self.calls.clone(),
                                        token.clone(),
                                        callback);

        // ...and hand the work over to the executor
        let delay = self.delay;
        let job = Box::new(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            server.complete(compute(input));
        });
        if let Err(rejected) = self.executor.execute(job) {
            // Forget the call before the job is dropped, so that the callback
            // is not invoked for work which never ran
            self.calls.discard(handle);
            let error = rejected.into_error();
            debug!(%handle, %error, "square root rejected by executor");
            return Err(error);
        }

        event!(Level::TRACE, message = "square root started", %handle, input);
        Ok(token)
    }

    fn end(&self, result: &AsyncResult) -> Result<f64> {
        self.calls.take(result.handle())
    }
}
//
impl fmt::Debug for SquareRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquareRoot")
            .field("outstanding_calls", &self.outstanding_calls())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}


/// The actual work
fn compute(input: f64) -> Result<f64> {
    if input.is_nan() || input < 0.0 {
        return Err(AsyncOpError::OperationFailed(
            format!("cannot take the square root of {input}")
        ));
    }
    Ok(input.sqrt())
}
