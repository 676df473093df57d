//! Handles to in-flight asynchronous calls
//!
//! Every call to an asynchronous operation's `begin` method registers a new
//! handle in a table owned by the operation. The worker that performs the call
//! records its result under that handle, and the operation's `end` method later
//! consumes it. A handle can be consumed exactly once.

use crate::error::{AsyncOpError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{event, Level};


/// Identifier of one in-flight asynchronous call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);
//
impl HandleId {
    /// Build a handle identifier from its raw integer value
    pub const fn from_raw(raw: u64) -> Self {
        HandleId(raw)
    }

    /// Raw integer value of this handle identifier
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}
//
impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


/// Caller-provided state which travels alongside an asynchronous call
pub type OpaqueState = Arc<dyn Any + Send + Sync>;


/// Token representing one in-flight asynchronous call
///
/// It is returned by `begin`, handed to the completion callback when the call
/// completes, and passed back to `end` to retrieve the call's result.
#[derive(Clone)]
pub struct AsyncResult {
    /// Handle under which the operation stores the call's result
    handle: HandleId,

    /// State which the caller attached to the call, if any
    state: Option<OpaqueState>,
}
//
impl AsyncResult {
    /// Create a token for some handle
    pub fn new(handle: HandleId, state: Option<OpaqueState>) -> Self {
        AsyncResult { handle, state }
    }

    /// Handle of the asynchronous call
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    /// State which the caller attached to the asynchronous call
    pub fn state(&self) -> Option<&OpaqueState> {
        self.state.as_ref()
    }

    /// Downcast the caller-provided state to a concrete type
    pub fn state_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state.as_deref().and_then(|s| s.downcast_ref::<T>())
    }
}
//
impl fmt::Debug for AsyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult")
            .field("handle", &self.handle)
            .field("has_state", &self.state.is_some())
            .finish()
    }
}


/// Table of in-flight calls for one asynchronous operation
#[derive(Debug)]
pub struct HandleTable<T> {
    /// Next handle identifier to be given out
    next_id: AtomicU64,

    /// Calls which have been registered but not consumed yet
    slots: Mutex<HashMap<HandleId, Slot<T>>>,
}
//
#[derive(Debug)]
enum Slot<T> {
    /// The work is still running
    Running,

    /// The work has produced a result, which awaits consumption
    Finished(Result<T>),
}
//
impl<T> HandleTable<T> {
    /// Create an empty handle table
    pub fn new() -> Self {
        HandleTable {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new in-flight call
    pub fn register(&self) -> HandleId {
        let handle = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(handle, Slot::Running);
        event!(Level::TRACE, message = "handle registered", %handle);
        handle
    }

    /// Record the result of a running call
    ///
    /// Returns false if the handle is not running anymore (or never was), in
    /// which case the result is discarded.
    pub fn finish(&self, handle: HandleId, result: Result<T>) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(&handle) {
            Some(slot) if matches!(slot, Slot::Running) => {
                event!(Level::TRACE, message = "handle finished", %handle,
                       success = result.is_ok());
                *slot = Slot::Finished(result);
                true
            }
            _ => false,
        }
    }

    /// Record that a running call will never produce a result
    pub fn abandon(&self, handle: HandleId) -> bool {
        self.finish(handle, Err(AsyncOpError::Abandoned))
    }

    /// Forget about a call whose work was never scheduled
    pub fn discard(&self, handle: HandleId) {
        self.lock().remove(&handle);
        event!(Level::TRACE, message = "handle discarded", %handle);
    }

    /// Consume the result of a finished call
    pub fn take(&self, handle: HandleId) -> Result<T> {
        let mut slots = self.lock();
        match slots.remove(&handle) {
            Some(Slot::Finished(result)) => result,
            Some(Slot::Running) => {
                // Not ready yet, put the call back in place
                slots.insert(handle, Slot::Running);
                Err(AsyncOpError::NotReady)
            }
            None => Err(AsyncOpError::InvalidHandle(handle)),
        }
    }

    /// Number of calls which have not been consumed yet
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Truth that no call is awaiting consumption
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding this lock cannot leave a slot half-written, so
    // poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, HashMap<HandleId, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
//
impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    /// Handles are distinct and start out running
    #[test]
    fn register() {
        let table = HandleTable::<u32>::new();
        let h1 = table.register();
        let h2 = table.register();
        assert_ne!(h1, h2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.take(h1), Err(AsyncOpError::NotReady));
        assert_eq!(table.len(), 2);
    }

    /// A finished result can be consumed exactly once
    #[test]
    fn take_once() {
        let table = HandleTable::new();
        let handle = table.register();
        assert!(table.finish(handle, Ok(42)));
        assert_eq!(table.take(handle), Ok(42));
        assert_eq!(table.take(handle), Err(AsyncOpError::InvalidHandle(handle)));
        assert!(table.is_empty());
    }

    /// Only running calls accept a result
    #[test]
    fn finish_once() {
        let table = HandleTable::new();
        let handle = table.register();
        assert!(table.finish(handle, Ok(1)));
        assert!(!table.finish(handle, Ok(2)));
        assert!(!table.abandon(handle));
        assert_eq!(table.take(handle), Ok(1));
    }

    /// Abandoned calls report it, discarded calls vanish
    #[test]
    fn abandon_and_discard() {
        let table = HandleTable::<u8>::new();
        let abandoned = table.register();
        let discarded = table.register();
        assert!(table.abandon(abandoned));
        table.discard(discarded);
        assert!(!table.abandon(discarded));
        assert_eq!(table.take(abandoned), Err(AsyncOpError::Abandoned));
        assert_eq!(table.take(discarded),
                   Err(AsyncOpError::InvalidHandle(discarded)));
    }

    /// Caller state can be recovered from the token
    #[test]
    fn token_state() {
        let token = AsyncResult::new(HandleId::from_raw(3),
                                     Some(Arc::new(String::from("ctx"))));
        assert_eq!(token.handle().as_raw(), 3);
        assert_eq!(token.state_as::<String>().map(String::as_str), Some("ctx"));
        assert!(token.state_as::<u32>().is_none());
    }
}
