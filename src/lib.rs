//! Callback-driven completion of asynchronous operations
//!
//! Picture yourself in a situation where: you want to delegate some work to
//! another thread. You know that the work is going to take some time, and you
//! have other things to do meanwhile, so you would rather not wait for its
//! completion. But at some point you will need its result, and you would like
//! to either wait for it with a bounded timeout, or check on it from time to
//! time without ever blocking.
//!
//! This crate implements the classic begin/end/callback answer to this
//! problem:
//!
//! - An asynchronous operation exposes `begin`, which schedules the work on an
//!   executor and returns a token right away, and `end`, which turns that token
//!   into the work's result once it is available.
//! - The caller hands a completion callback to `begin`. When the work is done,
//!   the callback is invoked exactly once, calls `end`, stores the outcome and
//!   sets a completion signal.
//! - The caller blocks on that signal with a timeout, or polls it, and then
//!   reads the stored result.
//!
//! The completion callback keeps the operation alive while the call is in
//! flight, and the executor keeps the callback alive until it has run, so the
//! caller is free to let go of either at any time.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use threaded_completion::{AsyncOperation, CompletionCallback, Outcome,
//!                           Runtime, RuntimeConfig, SquareRoot};
//!
//! let runtime = Runtime::startup(RuntimeConfig::default()).unwrap();
//! let op = Arc::new(SquareRoot::new(runtime.executor()));
//! let callback = CompletionCallback::new(&op);
//! op.begin(2.25, Some(callback.clone()), None).unwrap();
//!
//! assert_eq!(callback.wait_for_completion(Duration::from_secs(10)),
//!            Outcome::Done);
//! assert_eq!(callback.value(), 1.5);
//! runtime.shutdown();
//! ```

pub mod error;
pub mod executor;
pub mod handle;
pub mod multithread;
pub mod operation;
pub mod runtime;
pub mod server;
pub mod square_root;
pub mod status;

pub use error::{AsyncOpError, Result};
pub use executor::Executor;
pub use handle::{AsyncResult, HandleId, OpaqueState};
pub use multithread::callback::{AsyncCallback, CompletionCallback};
pub use multithread::polling::CompletionPoller;
pub use operation::AsyncOperation;
pub use runtime::{Runtime, RuntimeConfig};
pub use square_root::SquareRoot;
pub use status::Outcome;
