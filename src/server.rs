//! Server side of an asynchronous call
//!
//! This module contains the object which the work of an asynchronous call
//! carries around while it runs. It is in charge of recording the call's
//! result in the operation's handle table and of invoking the call's
//! completion callback, once and only once.
//!
//! If the server is dropped before the work has produced a result, e.g.
//! because the executor discarded the job or because the work panicked, the
//! call is marked as abandoned and the callback is still invoked, so that the
//! client never hangs waiting for a completion which will not come.

use crate::error::Result;
use crate::handle::{AsyncResult, HandleId, HandleTable};
use crate::multithread::callback::AsyncCallback;
use std::fmt;
use std::sync::Arc;
use tracing::{event, warn, Level};


/// Server interface, used to complete one asynchronous call
pub struct AsyncOpServer<T> {
    /// Handle table of the operation which this call belongs to
    calls: Arc<HandleTable<T>>,

    /// Token of the call, taken away once the call is completed
    token: Option<AsyncResult>,

    /// Callback to be notified of the call's completion
    callback: Arc<dyn AsyncCallback>,
}
//
impl<T> AsyncOpServer<T> {
    /// Create a server for a call which was registered in `calls`
    pub fn new(calls: Arc<HandleTable<T>>,
               token: AsyncResult,
               callback: Arc<dyn AsyncCallback>) -> Self {
        AsyncOpServer {
            calls,
            token: Some(token),
            callback,
        }
    }

    /// Handle of the call served by this server
    pub fn handle(&self) -> Option<HandleId> {
        self.token.as_ref().map(AsyncResult::handle)
    }

    /// Record the result of the call, then notify the completion callback
    pub fn complete(mut self, result: Result<T>) {
        if let Some(token) = self.token.take() {
            if self.calls.finish(token.handle(), result) {
                self.notify(token);
            }
        }
    }

    /// Propagate the completion to the client
    fn notify(&self, token: AsyncResult) {
        let handle = token.handle();
        event!(Level::TRACE, message = "invoking completion callback", %handle);
        if let Err(e) = self.callback.invoke(token) {
            warn!(%handle, error = %e, "completion callback reported a fault");
        }
    }
}
//
impl<T> Drop for AsyncOpServer<T> {
    /// If the server is killed before the call has been completed, notify the
    /// client in order to prevent it from hanging
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            // A call whose work was never scheduled is not tracked anymore,
            // and nobody is waiting for its callback
            if self.calls.abandon(token.handle()) {
                warn!(handle = %token.handle(), "call abandoned before completion");
                self.notify(token);
            }
        }
    }
}
//
impl<T> fmt::Debug for AsyncOpServer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOpServer")
            .field("handle", &self.handle())
            .finish_non_exhaustive()
    }
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AsyncOpError;
    use std::sync::Mutex;

    /// Callback which records the tokens it receives and the result which the
    /// operation holds for them
    struct Recorder {
        calls: Arc<HandleTable<u32>>,
        seen: Mutex<Vec<Result<u32>>>,
    }
    //
    impl AsyncCallback for Recorder {
        fn invoke(&self, result: AsyncResult) -> Result<()> {
            let value = self.calls.take(result.handle());
            self.seen.lock().unwrap().push(value);
            Ok(())
        }
    }

    fn setup() -> (Arc<HandleTable<u32>>, Arc<Recorder>) {
        let calls = Arc::new(HandleTable::new());
        let recorder = Arc::new(Recorder {
            calls: calls.clone(),
            seen: Mutex::new(Vec::new()),
        });
        (calls, recorder)
    }

    /// Check that the callback is called exactly once on completion
    #[test]
    fn complete() {
        let (calls, recorder) = setup();
        let handle = calls.register();
        let server = AsyncOpServer::new(calls.clone(),
                                        AsyncResult::new(handle, None),
                                        recorder.clone());
        assert!(recorder.seen.lock().unwrap().is_empty());

        server.complete(Ok(4));
        assert_eq!(*recorder.seen.lock().unwrap(), vec![Ok(4)]);
        assert!(calls.is_empty());
    }

    /// Check that dropping an uncompleted server abandons the call
    #[test]
    fn abandon_on_drop() {
        let (calls, recorder) = setup();
        let handle = calls.register();
        drop(AsyncOpServer::new(calls.clone(),
                                AsyncResult::new(handle, None),
                                recorder.clone()));
        assert_eq!(*recorder.seen.lock().unwrap(),
                   vec![Err(AsyncOpError::Abandoned)]);
    }

    /// Check that a discarded call does not trigger the callback
    #[test]
    fn discarded_call() {
        let (calls, recorder) = setup();
        let handle = calls.register();
        let server = AsyncOpServer::new(calls.clone(),
                                        AsyncResult::new(handle, None),
                                        recorder.clone());
        calls.discard(handle);
        drop(server);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
