//! Manually driven executor
//!
//! Jobs submitted to this executor are only queued. They run when the owner
//! calls `run_one` or `run_pending`, on the owner's thread. This makes it
//! possible to observe an operation between `begin` and the execution of its
//! work, which no other executor can guarantee.

use crate::error::AsyncOpError;
use crate::executor::{Executor, Job, RejectedJob};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{event, Level};


/// Executor which runs queued jobs on demand
#[derive(Default)]
pub struct ManualExecutor {
    /// Jobs waiting to be run, in submission order
    queue: Mutex<VecDeque<Job>>,

    /// Maximal number of queued jobs, if any
    capacity: Option<usize>,
}
//
impl ManualExecutor {
    /// Create an executor with an unbounded queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor which rejects jobs once `capacity` are queued
    pub fn with_capacity(capacity: usize) -> Self {
        ManualExecutor {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    /// Run the oldest queued job, if any. Returns whether a job was run.
    pub fn run_one(&self) -> bool {
        // The lock must not be held while the job runs, as it may submit more
        let job = self.lock().pop_front();
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run queued jobs until the queue is empty, returning how many ran
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while self.run_one() {
            count += 1;
        }
        count
    }

    /// Drop every queued job without running it
    pub fn discard_pending(&self) -> usize {
        let jobs = std::mem::take(&mut *self.lock());
        let count = jobs.len();
        drop(jobs);
        event!(Level::DEBUG, message = "discarded queued jobs", count);
        count
    }

    /// Number of queued jobs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Truth that no job is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
//
impl Executor for ManualExecutor {
    fn execute(&self, job: Job) -> Result<(), RejectedJob> {
        let mut queue = self.lock();
        if let Some(capacity) = self.capacity {
            if queue.len() >= capacity {
                event!(Level::DEBUG, message = "manual queue full", capacity);
                return Err(RejectedJob::new(
                    job,
                    AsyncOpError::ResourceExhausted(format!(
                        "manual executor queue is full ({capacity} jobs)"
                    )),
                ));
            }
        }
        queue.push_back(job);
        Ok(())
    }
}
//
impl std::fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("queued", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
