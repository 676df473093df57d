//! Asynchronous operation interface
//!
//! An asynchronous operation is started with `begin`, which schedules the work
//! on an executor and returns immediately with a token for the in-flight call.
//! When the work is done, the completion callback passed to `begin` is invoked
//! exactly once with that token, and is expected to call `end` in order to
//! retrieve the call's result.

use crate::error::Result;
use crate::handle::{AsyncResult, OpaqueState};
use crate::multithread::callback::AsyncCallback;
use std::sync::Arc;


/// Begin/end contract honored by every asynchronous operation
pub trait AsyncOperation: Send + Sync + 'static {
    /// Input of one call to the operation
    type Input;

    /// Result of one successful call to the operation
    type Output: Clone + Default + Send + Sync + 'static;

    /// Start a new call to the operation
    ///
    /// The work runs on the operation's executor, and `callback` is invoked
    /// exactly once when it is done. Fails without ever invoking the callback
    /// if no callback is provided or if the executor refuses the work.
    fn begin(&self,
             input: Self::Input,
             callback: Option<Arc<dyn AsyncCallback>>,
             state: Option<OpaqueState>) -> Result<AsyncResult>;

    /// Retrieve the result of a completed call
    ///
    /// Must be called once per call, normally from the completion callback.
    /// Calling it again for the same call fails with `InvalidHandle`.
    fn end(&self, result: &AsyncResult) -> Result<Self::Output>;
}
