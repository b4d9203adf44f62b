//! Invoking external tools as child processes.

use super::base::ReconTool;
use crate::domain::Target;
use crate::error::{ReconError, ReconResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

const STDERR_PREVIEW_BYTES: usize = 500;

/// Result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Exit code; `None` when the process died to a signal.
    pub exit_code: Option<i32>,
    /// Contents of the tool's output file; empty when the file is missing.
    pub output: String,
    /// Where the output file lives.
    pub output_path: PathBuf,
    /// Truncated stderr, kept for failure reporting and rate-limit detection.
    pub stderr_tail: String,
    pub duration_ms: u64,
}

/// Runs one tool invocation to completion, within a timeout.
///
/// Implemented by [`ProcessInvoker`] in production; tests substitute a
/// scripted fake so pipelines run without any binaries installed.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(
        &self,
        tool: &dyn ReconTool,
        target: &Target,
        data_dir: &Path,
        timeout: Duration,
    ) -> ReconResult<ToolOutcome>;
}

/// Spawns the real binary via `tokio::process`.
pub struct ProcessInvoker;

#[async_trait]
impl ToolInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        tool: &dyn ReconTool,
        target: &Target,
        data_dir: &Path,
        timeout: Duration,
    ) -> ReconResult<ToolOutcome> {
        if !tool.check_available() {
            return Err(ReconError::ToolUnavailable {
                tool: tool.name().to_string(),
            });
        }

        let args = tool.build_args(target, data_dir);
        let output_path = tool.output_path(data_dir, &target.name);
        debug!(tool = tool.name(), target = %target.name, args = %args.join(" "), "invoking tool");

        let mut cmd = Command::new(tool.binary());
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let started = Instant::now();
        // Dropping the output future on timeout kills the child; the
        // per-invocation timeout is the only forceful cancellation path.
        let result = tokio::time::timeout(timeout, cmd.output()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let process_output = match result {
            Err(_) => {
                return Err(ReconError::ToolTimeout {
                    tool: tool.name().to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReconError::ToolUnavailable {
                    tool: tool.name().to_string(),
                });
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(output)) => output,
        };

        let stderr_tail = stderr_preview(&process_output.stderr);

        let output = tokio::fs::read_to_string(&output_path)
            .await
            .unwrap_or_default();

        Ok(ToolOutcome {
            exit_code: process_output.status.code(),
            output,
            output_path,
            stderr_tail,
            duration_ms,
        })
    }
}

/// First bytes of stderr, lossily decoded. Truncation happens on the raw
/// bytes before decoding, so a cut that lands inside a multi-byte character
/// yields a replacement character instead of a char-boundary panic.
fn stderr_preview(raw: &[u8]) -> String {
    let end = raw.len().min(STDERR_PREVIEW_BYTES);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
