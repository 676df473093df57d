//! Thread pool executor
//!
//! A fixed set of worker threads pull jobs from a bounded queue. Submission
//! never blocks: when the queue is full, the job is handed back to the caller
//! as a resource exhaustion error. Shutting the pool down closes the queue,
//! lets the workers drain the jobs which were already accepted, and joins them.

use crate::error::AsyncOpError;
use crate::executor::{Executor, Job, RejectedJob};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, event, Level};


/// Executor running jobs on a pool of worker threads
pub struct ThreadPoolExecutor {
    /// Job submission end of the queue, removed on shutdown
    sender: Mutex<Option<Sender<Job>>>,

    /// Worker threads, removed when joined
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Queue capacity, for diagnostics
    capacity: usize,
}
//
impl ThreadPoolExecutor {
    /// Spawn `worker_threads` workers named after `thread_name`, sharing a
    /// queue of `queue_capacity` jobs
    pub fn new(worker_threads: usize,
               queue_capacity: usize,
               thread_name: &str) -> Result<Self, AsyncOpError> {
        if worker_threads == 0 {
            return Err(AsyncOpError::InvalidArgument(
                "a thread pool needs at least one worker".into()
            ));
        }
        if queue_capacity == 0 {
            return Err(AsyncOpError::InvalidArgument(
                "a thread pool needs room for at least one queued job".into()
            ));
        }

        // Setup the job queue...
        let (sender, receiver) = bounded::<Job>(queue_capacity);

        // ...then spawn the workers
        let mut workers = Vec::with_capacity(worker_threads);
        for index in 0..worker_threads {
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("{thread_name}-{index}"))
                .spawn(move || worker_loop(receiver));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Stop the workers which did start before bailing out
                    drop(sender);
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(AsyncOpError::ResourceExhausted(
                        format!("cannot spawn worker thread: {e}")
                    ));
                }
            }
        }
        debug!(worker_threads, queue_capacity, "thread pool started");

        Ok(ThreadPoolExecutor {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            capacity: queue_capacity,
        })
    }

    /// Stop accepting jobs, run the ones already queued, and join the workers
    ///
    /// Calling this more than once is harmless. When called from one of the
    /// pool's own workers, that worker is left to exit on its own.
    pub fn shutdown(&self) {
        // Closing the queue makes the workers exit once it is drained
        let sender = lock(&self.sender).take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *lock(&self.workers));
        let count = workers.len();
        let current = thread::current().id();
        for worker in workers {
            // The last reference to the pool may be released by a job
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                error!("thread pool worker exited abnormally");
            }
        }
        debug!(workers = count, "thread pool shut down");
    }

    /// Stop accepting jobs without waiting for the ones already queued
    ///
    /// The workers keep draining the queue in the background, but are not
    /// joined, so they do not keep the process alive once `main` returns.
    pub fn close(&self) {
        let sender = lock(&self.sender).take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let detached = std::mem::take(&mut *lock(&self.workers)).len();
        debug!(workers = detached, "thread pool closed without joining");
    }

    /// Truth that the pool has been shut down
    pub fn is_shut_down(&self) -> bool {
        lock(&self.sender).is_none()
    }
}
//
impl Executor for ThreadPoolExecutor {
    fn execute(&self, job: Job) -> Result<(), RejectedJob> {
        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(RejectedJob::new(job, AsyncOpError::ShutDown));
        };
        match sender.try_send(job) {
            Ok(()) => {
                event!(Level::TRACE, message = "job queued",
                       queued = sender.len());
                Ok(())
            }
            Err(TrySendError::Full(job)) => {
                debug!(capacity = self.capacity, "thread pool queue full");
                Err(RejectedJob::new(
                    job,
                    AsyncOpError::ResourceExhausted(format!(
                        "thread pool queue is full ({} jobs)", self.capacity
                    )),
                ))
            }
            Err(TrySendError::Disconnected(job)) => {
                Err(RejectedJob::new(job, AsyncOpError::ShutDown))
            }
        }
    }
}
//
impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
//
impl std::fmt::Debug for ThreadPoolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolExecutor")
            .field("workers", &lock(&self.workers).len())
            .field("capacity", &self.capacity)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}


/// Body of every worker thread
fn worker_loop(receiver: Receiver<Job>) {
    for job in receiver.iter() {
        // A panicking job must not take the worker down with it. Its call gets
        // abandoned as the job's captures are dropped during unwinding.
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("job panicked on a thread pool worker");
        }
    }
}


fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
