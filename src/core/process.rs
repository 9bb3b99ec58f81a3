//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (the search delegate)
//! with a hard timeout so a hung child never blocks a webhook delivery.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of a bounded process run that did not produce output.
#[derive(Debug)]
pub enum RunError {
    /// The process could not be spawned or waited on.
    Io(std::io::Error),
    /// The process exceeded its time budget and was killed.
    TimedOut(Duration),
}

/// Run an async Command with a timeout.
///
/// The child is spawned with `kill_on_drop`, so when the timeout fires and
/// the output future is dropped, the process is terminated.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, RunError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(RunError::Io(e)),
        Err(_) => Err(RunError::TimedOut(timeout)),
    }
}
