//! Analyzer process execution and output capture.

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{DgmlError, Result};
use crate::request::AnalysisRequest;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Prefix the analyzer uses on stdout to report a domain failure.
pub const ERROR_PREFIX: &str = "Error:";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Captured analyzer output.
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// Everything the analyzer wrote to stdout.
    pub stdout: String,

    /// Everything the analyzer wrote to stderr (diagnostics only).
    pub stderr: String,

    /// Exit code, -1 when terminated by a signal. Not used to judge success.
    pub exit_code: i32,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl RawOutput {
    /// Whether stdout carries the `Error:` sentinel.
    pub fn is_error(&self) -> bool {
        self.stdout.starts_with(ERROR_PREFIX)
    }

    /// Consume the output, turning the `Error:` sentinel into [`DgmlError::Analysis`].
    pub fn into_analysis(self) -> Result<String> {
        check_analysis(self.stdout)
    }
}

/// Apply the `Error:` convention to analyzer stdout.
///
/// The exit code plays no part: the analyzer reports domain failures on
/// stdout only.
pub fn check_analysis(stdout: String) -> Result<String> {
    match stdout.strip_prefix(ERROR_PREFIX) {
        Some(message) => Err(DgmlError::Analysis(message.trim().to_string())),
        None => Ok(stdout),
    }
}

/// Runs the analyzer executable against one artifact.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout_secs: u64,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProcessRunner {
    /// Create a runner with a timeout ceiling in seconds (0 = wait forever).
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Launch the analyzer and capture its output.
    ///
    /// Stdout is read incrementally while the process runs, then read once
    /// more after exit so bytes written after the exit check are not lost.
    /// Stderr is drained concurrently.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<RawOutput> {
        let start = Instant::now();
        info!(command = %request.command_line(), cwd = %request.working_dir.display(), "Launching analyzer");

        let mut command = Command::new(&request.executable_path);
        command
            .arg(request.argument())
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let launch_error = |reason: String| DgmlError::Launch {
            path: request.executable_path.display().to_string(),
            reason,
        };

        let mut child = command.spawn().map_err(|e| launch_error(e.to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| launch_error("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| launch_error("stderr was not captured".to_string()))?;

        let capture = capture_output(child, stdout, stderr);
        let (stdout, stderr, status) = if self.timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(self.timeout_secs), capture)
                .await
                .map_err(|_| {
                    warn!(limit_secs = self.timeout_secs, "Analyzer timed out, killing it");
                    DgmlError::Timeout {
                        limit_secs: self.timeout_secs,
                    }
                })??
        } else {
            capture.await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&stderr).to_string();
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "Analyzer wrote to stderr");
        }
        info!(exit_code, duration_ms, bytes = stdout.len(), "Analyzer finished");

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr,
            exit_code,
            duration_ms,
        })
    }
}

async fn capture_output(
    mut child: Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> Result<(Vec<u8>, Vec<u8>, ExitStatus)> {
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await.map(|_| buf)
    });

    let mut out = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut stdout_open = true;

    let status = loop {
        tokio::select! {
            read = stdout.read(&mut chunk), if stdout_open => match read? {
                0 => stdout_open = false,
                n => out.extend_from_slice(&chunk[..n]),
            },
            status = child.wait() => break status?,
        }
    };

    // Drain whatever was written between the last read and the exit.
    stdout.read_to_end(&mut out).await?;

    let err = stderr_task.await.map_err(std::io::Error::other)??;
    Ok((out, err, status))
}
