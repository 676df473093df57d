//! Multithreaded completion monitoring
//!
//! This submodule provides the client side of the completion protocol, in
//! situations where the work of an asynchronous call runs on another thread of
//! the same OS process as the client.
//!
//! Three monitoring mechanisms are proposed:
//!
//! - Callbacks are how the worker tells the client that a call has completed.
//!   The completion callback retrieves the call's result and publishes it to
//!   the two other mechanisms.
//! - Blocking allows a client to wait for the completion, with a timeout.
//!   Although easy to use and reason about, this synchronization method should
//!   be used sparingly as it can have a strong averse effect on application
//!   performance.
//! - Polling is suitable when a client is only interested in periodically
//!   checking whether the call is done, and must never block. One possible use
//!   case is refreshing UI controls.

pub mod blocking;
pub mod callback;
pub mod polling;
