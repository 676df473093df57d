//! Facilities to represent the outcome of asynchronous operations
//!
//! The model is the following: an asynchronous operation starts out in a
//! pending state as soon as it is submitted, and eventually reaches a final
//! state once its completion callback has run. That final state is either a
//! success, in which case the operation's result may be read, or an error
//! explaining why no result will ever be available.

use crate::error::AsyncOpError;
use std::fmt;


/// Outcome of an asynchronous operation, as seen by its client
///
/// Here are the possible state transitions:
///
/// - Pending -> Done / Error
///
/// Once the operation is in either the Done or Error state, its outcome won't
/// change anymore.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    /// The operation has been submitted, but has not completed yet
    #[default]
    Pending,

    /// The operation completed successfully and its result may be read
    Done,

    /// The operation will never produce a result
    Error(AsyncOpError),
}
//
impl Outcome {
    /// Check if this outcome is final (i.e. won't change anymore)
    pub fn is_final(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }

    /// Check if this outcome reports a successful completion
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }

    /// Access the error carried by this outcome, if any
    pub fn error(&self) -> Option<&AsyncOpError> {
        match self {
            Outcome::Error(e) => Some(e),
            Outcome::Pending | Outcome::Done => None,
        }
    }
}
//
impl<T> From<&crate::error::Result<T>> for Outcome {
    fn from(result: &crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => Outcome::Done,
            Err(e) => Outcome::Error(e.clone()),
        }
    }
}
//
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => write!(f, "pending"),
            Outcome::Done => write!(f, "done"),
            Outcome::Error(e) => write!(f, "error ({e})"),
        }
    }
}
