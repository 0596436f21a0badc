//! Subprocess runner for external media tools.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::ProcessingError;

/// Run `program` to completion under `timeout`.
///
/// The child is killed if the timeout fires or the calling future is dropped.
/// A non-zero exit is not an error here; callers inspect `Output::status`.
pub async fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<Output, ProcessingError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessingError::ToolUnavailable {
            tool: program.to_string(),
            source,
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            tracing::warn!(
                tool = %program,
                timeout_secs = timeout.as_secs(),
                "Media tool timed out, killing process"
            );
            Err(ProcessingError::ToolTimeout {
                tool: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}

/// Last few lines of a tool's stderr, for logs.
pub fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().rev().take(10).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join("\n")
}
