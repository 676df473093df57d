//! Polling-based completion monitoring
//!
//! This module provides a way to monitor asynchronous operations through
//! polling. It is meant for clients which must never block, not even briefly
//! on a mutex, and only want to periodically check whether an operation has
//! completed, as is the case for example when refreshing user interfaces.

use crate::status::Outcome;
use std::fmt;
use triple_buffer::{Input, Output, TripleBuffer};


/// Create a connected publisher/poller pair, starting in the pending state
pub fn channel() -> (OutcomePublisher, CompletionPoller) {
    // Setup triple buffer-based publisher/poller communication
    let (buf_input, buf_output) = TripleBuffer::new(&Outcome::Pending).split();
    (OutcomePublisher { buf_input }, CompletionPoller { buf_output })
}


/// Producer side, used by a completion callback to publish its outcome
pub struct OutcomePublisher {
    /// New outcomes will be sent through this triple buffer
    buf_input: Input<Outcome>,
}
//
impl OutcomePublisher {
    /// Make a new outcome visible to the poller
    pub fn publish(&mut self, outcome: Outcome) {
        self.buf_input.write(outcome);
    }
}
//
impl fmt::Debug for OutcomePublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomePublisher").finish_non_exhaustive()
    }
}


/// Client side, used to check an operation's outcome without ever blocking
pub struct CompletionPoller {
    /// Current outcome will be read through this triple buffer
    buf_output: Output<Outcome>,
}
//
impl CompletionPoller {
    /// Access the latest published outcome
    pub fn poll(&mut self) -> &Outcome {
        self.buf_output.read()
    }

    /// Truth that the operation has reached a final outcome
    pub fn is_complete(&mut self) -> bool {
        self.poll().is_final()
    }
}
//
impl fmt::Debug for CompletionPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionPoller").finish_non_exhaustive()
    }
}
