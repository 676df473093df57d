//! Executors running the work of asynchronous operations
//!
//! An asynchronous operation does not own the threads which perform its work.
//! Instead, it hands self-contained jobs over to an executor, which decides
//! where and when they run. Each job finishes by completing its call and
//! invoking the call's completion callback, so the executor is also what ends
//! up running callbacks.
//!
//! Several strategies are provided:
//!
//! - The inline executor runs jobs directly on the submitting thread, as part
//!   of `begin`. It has minimal overhead, but means that `begin` blocks for the
//!   duration of the work and that callbacks run before `begin` returns.
//! - The thread pool executor runs jobs on a fixed set of worker threads fed
//!   by a bounded queue. This is the general-purpose choice.
//! - The manual executor only queues jobs, and runs them when explicitly told
//!   to. It lets tests and single-threaded drivers control exactly when work
//!   happens.

pub mod inline;
pub mod manual;
pub mod thread_pool;

use crate::error::AsyncOpError;
use std::fmt;


/// Unit of work submitted to an executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;


/// Entry point to work scheduling
pub trait Executor: Send + Sync {
    /// Schedule a job for execution
    ///
    /// If the job cannot be accepted, it is handed back to the caller along
    /// with the reason, so that the caller can clean up before it is dropped.
    fn execute(&self, job: Job) -> Result<(), RejectedJob>;
}


/// A job which an executor refused to run
pub struct RejectedJob {
    /// Why the executor refused the job
    error: AsyncOpError,

    /// The job itself, which has not been run
    job: Job,
}
//
impl RejectedJob {
    /// Hand a job back to its submitter
    pub fn new(job: Job, error: AsyncOpError) -> Self {
        RejectedJob { error, job }
    }

    /// Why the executor refused the job
    pub fn error(&self) -> &AsyncOpError {
        &self.error
    }

    /// Recover the job, e.g. to submit it elsewhere
    pub fn into_job(self) -> Job {
        self.job
    }

    /// Drop the job and keep the reason for the refusal
    pub fn into_error(self) -> AsyncOpError {
        self.error
    }
}
//
impl fmt::Debug for RejectedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectedJob")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
