//! Inline executor, implementing synchronous job execution
//!
//! This executor follows the traditional pattern of directly running the work
//! on the thread which requested it. The completion callback therefore runs
//! before `begin` even returns. This can harm caller responsiveness, but for
//! short performance-critical work it avoids any scheduling overhead.

use crate::executor::{Executor, Job, RejectedJob};
use tracing::{event, Level};


/// Executor implementation suitable for inline job execution
#[derive(Debug, Default)]
pub struct InlineExecutor {}
//
impl InlineExecutor {
    /// Create a new inline executor
    pub fn new() -> Self {
        InlineExecutor {}
    }
}
//
impl Executor for InlineExecutor {
    fn execute(&self, job: Job) -> Result<(), RejectedJob> {
        event!(Level::TRACE, message = "running job inline");
        job();
        Ok(())
    }
}
