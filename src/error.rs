//! Errors reported by asynchronous operations and their completion callbacks
//!
//! A single error type covers the whole completion protocol. Some variants are
//! reported synchronously to the caller (bad arguments, executor refusal),
//! while others travel through the completion callback and end up stored as
//! the final outcome of an operation (work failure, abandonment).

use crate::handle::HandleId;
use thiserror::Error;


/// Any error that may arise while starting, completing or waiting for an
/// asynchronous operation
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AsyncOpError {
    /// Bad input was passed to an operation entry point
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource needed to start the operation could not be obtained, e.g.
    /// the executor queue is full or a worker thread could not be spawned
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The result was requested before the scheduled work had finished
    #[error("operation not ready")]
    NotReady,

    /// The handle is unknown to the operation, most likely because its result
    /// was already consumed
    #[error("invalid handle {0}")]
    InvalidHandle(HandleId),

    /// The scheduled work itself failed
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The blocking primitive used to wait for completion failed
    #[error("wait failed: {0}")]
    WaitFailed(String),

    /// The scheduled work was dropped before it could produce a result
    #[error("operation abandoned before completion")]
    Abandoned,

    /// The runtime owning the executor has been shut down
    #[error("runtime is shut down")]
    ShutDown,

    /// An API contract was violated, e.g. a callback was invoked twice
    #[error("contract violation: {0}")]
    ContractViolation(String),
}


/// A specialized `Result` for asynchronous operation APIs
pub type Result<T> = std::result::Result<T, AsyncOpError>;
