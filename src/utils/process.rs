//! External process invocation
//!
//! Programs are started with an explicit argument vector (no shell), their
//! exit status is checked and stderr is kept for the error message.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Maximum number of stderr bytes kept in an error message
const STDERR_TAIL_BYTES: usize = 2048;

/// Failure of a single tool invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {code}: {stderr}")]
    Failed {
        program: String,
        code: String,
        stderr: String,
    },
}

/// Captured output of a successful invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `program` with `args`, bounded by `timeout` when set.
///
/// The child is killed if the timeout elapses.
pub async fn run_tool(
    program: &str,
    args: &[OsString],
    timeout: Option<Duration>,
) -> Result<ToolOutput, ToolError> {
    debug!(program, ?args, "Running external tool");
    let started = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout {
                program: program.to_string(),
                timeout: limit,
            })?,
        None => child.wait_with_output().await,
    }
    .map_err(|e| ToolError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    let stderr = stderr_tail(&output.stderr);
    if !output.status.success() {
        let code = output
            .status
            .code()
            .map(|c| format!("status {}", c))
            .unwrap_or_else(|| "a signal".to_string());
        return Err(ToolError::Failed {
            program: program.to_string(),
            code,
            stderr,
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        stderr,
        elapsed: started.elapsed(),
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &trimmed[start..])
}
