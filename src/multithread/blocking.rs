//! Blocking completion signal
//!
//! This module provides a write-once slot which a client can block on until
//! the slot is filled. This synchronization mechanism is easy to use and
//! reason about, but should be used with care as the unpredictable delays that
//! it introduces can be harmful to application performance.
//!
//! The value is written under the same mutex that the waiter acquires when it
//! wakes up, so everything the writer did before filling the slot is visible
//! to a waiter which observes it filled.

use crate::error::{AsyncOpError, Result};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};


/// Write-once slot which clients can wait on
#[derive(Debug)]
pub struct CompletionSignal<T> {
    /// Value of the slot, None until the signal is set (mutex-protected)
    slot: Mutex<Option<T>>,

    /// Condition variable used to wake up waiting clients
    set_cv: Condvar,
}
//
impl<T: Clone> CompletionSignal<T> {
    /// Create an unset signal
    pub fn new() -> Self {
        CompletionSignal {
            slot: Mutex::new(None),
            set_cv: Condvar::new(),
        }
    }

    /// Fill the slot and wake up every waiting client
    ///
    /// A signal can only be set once. Further attempts fail and hand the
    /// rejected value back.
    pub fn set(&self, value: T) -> std::result::Result<(), T> {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(_) => return Err(value),
        };
        if slot.is_some() {
            return Err(value);
        }
        *slot = Some(value);
        drop(slot);

        // Notify the waiters that the signal has been set
        self.set_cv.notify_all();
        Ok(())
    }

    /// Wait up to `timeout` for the signal to be set
    ///
    /// Returns a copy of the value if the signal was set in time, and None if
    /// the timeout elapsed first. Returns immediately if the signal is already
    /// set, whatever the timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        // Access the current slot state
        let mut slot = self.slot.lock().map_err(poisoned)?;

        // Only wait if the signal is not set yet, accounting for spurious
        // wakeups by tracking the deadline ourselves
        let deadline = Instant::now().checked_add(timeout);
        while slot.is_none() {
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    deadline - now
                }
                // The deadline is too far away to be represented
                None => timeout,
            };
            let (guard, _) = self.set_cv
                                 .wait_timeout(slot, remaining)
                                 .map_err(poisoned)?;
            slot = guard;
        }
        Ok(slot.clone())
    }

    /// Wait for the signal to be set, without any timeout
    pub fn wait(&self) -> Result<T> {
        let slot = self.slot.lock().map_err(poisoned)?;
        let slot = self.set_cv
                       .wait_while(slot, |slot| slot.is_none())
                       .map_err(poisoned)?;
        slot.clone().ok_or_else(|| {
            AsyncOpError::WaitFailed("woke up from an unset signal".into())
        })
    }

    /// Copy of the value, if the signal is set. Never blocks on the signal.
    pub fn peek(&self) -> Result<Option<T>> {
        Ok(self.slot.lock().map_err(poisoned)?.clone())
    }

    /// Truth that the signal has been set
    pub fn is_set(&self) -> bool {
        matches!(self.slot.lock().as_deref(), Ok(Some(_)))
    }
}
//
impl<T: Clone> Default for CompletionSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}


/// A poisoned lock means that a thread panicked while touching the signal,
/// which must not be mistaken for a completion
fn poisoned<G>(_: std::sync::PoisonError<G>) -> AsyncOpError {
    AsyncOpError::WaitFailed(
        "completion signal was poisoned by a panicking thread".into()
    )
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    /// Check the initial state of the signal
    #[test]
    fn initial_state() {
        let signal = CompletionSignal::<u32>::new();
        assert!(!signal.is_set());
        assert_eq!(signal.peek(), Ok(None));
        assert_eq!(signal.wait_timeout(Duration::ZERO), Ok(None));
    }

    /// Check that a signal is set once and only once
    #[test]
    fn set_once() {
        let signal = CompletionSignal::new();
        assert_eq!(signal.set(1), Ok(()));
        assert_eq!(signal.set(2), Err(2));
        assert!(signal.is_set());
        assert_eq!(signal.peek(), Ok(Some(1)));
    }

    /// Waiting on a set signal returns immediately, whatever the timeout
    #[test]
    fn wait_after_set() {
        let signal = CompletionSignal::new();
        signal.set("done").unwrap();
        assert_eq!(signal.wait_timeout(Duration::ZERO), Ok(Some("done")));
        assert_eq!(signal.wait_timeout(Duration::MAX), Ok(Some("done")));
        assert_eq!(signal.wait(), Ok("done"));
    }

    /// Check that waiting clients are woken up by another thread
    #[test]
    fn cross_thread_wakeup() {
        let signal = Arc::new(CompletionSignal::new());
        let w_signal = signal.clone();
        let waiter = thread::spawn(move || {
            w_signal.wait_timeout(Duration::from_secs(60))
        });

        thread::sleep(Duration::from_millis(20));
        signal.set(7u64).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(Some(7)));
    }

    /// A panic while holding the lock is reported as a wait failure
    #[test]
    fn poisoning() {
        let signal = Arc::new(CompletionSignal::<u8>::new());
        let p_signal = signal.clone();
        let _ = thread::spawn(move || {
            let _guard = p_signal.slot.lock().unwrap();
            panic!("poisoning the signal");
        }).join();

        assert!(matches!(signal.wait_timeout(Duration::ZERO),
                         Err(AsyncOpError::WaitFailed(_))));
        assert!(!signal.is_set());
    }
}
