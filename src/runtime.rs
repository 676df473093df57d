//! Runtime context owning the worker threads
//!
//! Asynchronous operations need somewhere to run their work. Rather than
//! relying on process-wide state which must be initialized before use and torn
//! down afterwards, the worker threads are owned by an explicit `Runtime`
//! object. Operations receive its executor at construction time, and the
//! runtime's shutdown drains and joins the workers.

use crate::error::{AsyncOpError, Result};
use crate::executor::thread_pool::ThreadPoolExecutor;
use crate::executor::Executor;
use std::sync::Arc;
use std::thread;
use tracing::info;


/// Default number of jobs which may wait for a worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default prefix of worker thread names
pub const DEFAULT_THREAD_NAME: &str = "completion-worker";


/// Runtime configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of worker threads
    pub worker_threads: usize,

    /// Number of jobs which may wait for a worker before submissions fail
    pub queue_capacity: usize,

    /// Prefix of worker thread names
    pub thread_name: String,
}
//
impl RuntimeConfig {
    /// Set the number of worker threads
    #[must_use]
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Set the job queue capacity
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Set the prefix of worker thread names
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Check that this configuration describes a usable runtime
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(AsyncOpError::InvalidArgument(
                "worker_threads must be at least 1".into()
            ));
        }
        if self.queue_capacity == 0 {
            return Err(AsyncOpError::InvalidArgument(
                "queue_capacity must be at least 1".into()
            ));
        }
        Ok(())
    }
}
//
impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            worker_threads: thread::available_parallelism().map_or(1, usize::from),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}


/// Running set of worker threads
#[derive(Debug)]
pub struct Runtime {
    /// Executor feeding the worker threads
    pool: Arc<ThreadPoolExecutor>,

    /// Configuration the runtime was started with
    config: RuntimeConfig,
}
//
impl Runtime {
    /// Start the worker threads
    pub fn startup(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolExecutor::new(config.worker_threads,
                                           config.queue_capacity,
                                           &config.thread_name)?;
        info!(worker_threads = config.worker_threads,
              queue_capacity = config.queue_capacity,
              "runtime started");
        Ok(Runtime {
            pool: Arc::new(pool),
            config,
        })
    }

    /// Executor which operations should submit their work to
    pub fn executor(&self) -> Arc<dyn Executor> {
        self.pool.clone()
    }

    /// Configuration the runtime was started with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run the work which was already submitted, then stop the workers
    ///
    /// Operations which still hold the executor afterwards see their new
    /// calls fail with `ShutDown`.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Stop accepting work, without waiting for the work already submitted
    ///
    /// Meant for bailing out: whatever is still queued or running is left to
    /// the detached workers, which die with the process.
    pub fn shutdown_detached(self) {
        self.pool.close();
        info!("runtime detached from its workers");
    }
}
//
impl Drop for Runtime {
    fn drop(&mut self) {
        self.pool.shutdown();
        info!("runtime shut down");
    }
}
