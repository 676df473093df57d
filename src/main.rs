//! Square root driver
//!
//! Starts a runtime, computes a square root asynchronously, waits for the
//! completion callback and prints the result. Any failing step is reported
//! along with its error, and makes the process exit with a non-zero status
//! right away, without waiting for the work which is still in flight.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use threaded_completion::{AsyncOperation, CompletionCallback, Outcome,
                          Runtime, RuntimeConfig, SquareRoot};
use tracing::{info, Level};


/// Compute a square root on a worker thread and wait for the result
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number to take the square root of
    #[arg(default_value_t = 1.1, allow_negative_numbers = true)]
    input: f64,

    /// How long to wait for the completion, in milliseconds
    #[arg(long, default_value_t = 1_000_000)]
    timeout_ms: u64,

    /// Number of worker threads (defaults to the available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Number of jobs which may wait for a worker
    #[arg(long, default_value_t = threaded_completion::runtime::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Simulated duration of the computation, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}


fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Bring up the worker threads
    let mut config = RuntimeConfig::default().with_queue_capacity(args.queue_capacity);
    if let Some(workers) = args.workers {
        config = config.with_worker_threads(workers);
    }
    let runtime = match Runtime::startup(config) {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("runtime startup failed, err {e}");
            return ExitCode::FAILURE;
        }
    };

    // Start the computation
    let op = Arc::new(
        SquareRoot::new(runtime.executor())
            .with_delay(Duration::from_millis(args.delay_ms))
    );
    let callback = CompletionCallback::new(&op);
    if let Err(e) = op.begin(args.input, Some(callback.clone()), None) {
        println!("begin square root failed, err {e}");
        runtime.shutdown_detached();
        return ExitCode::FAILURE;
    }

    // Wait for it to complete
    match callback.wait_for_completion(Duration::from_millis(args.timeout_ms)) {
        Outcome::Done => {}
        Outcome::Pending => {
            println!("wait for completion timed out after {} ms",
                     args.timeout_ms);
            runtime.shutdown_detached();
            return ExitCode::FAILURE;
        }
        Outcome::Error(e) => {
            println!("wait for completion failed, err {e}");
            runtime.shutdown_detached();
            return ExitCode::FAILURE;
        }
    }
    println!("square_root({}) = {}", args.input, callback.value());

    drop(callback);
    drop(op);
    runtime.shutdown();
    info!("done");
    ExitCode::SUCCESS
}
