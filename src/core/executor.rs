//! Command execution for running checks.
//!
//! This module launches external tools with timeout support and output
//! capture. [`CommandExecutor`] is the seam the check runners go through, so
//! the pipeline can be driven without spawning real processes.

use crate::core::error::{Error, Result};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;

/// Default timeout for a single tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Exit code reported for invocations killed on timeout.
const TIMEOUT_EXIT_CODE: i32 = 124;

/// A program and its arguments, launched without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to launch.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Creates a command line from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Output from a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Whether the command was killed due to timeout.
    pub timed_out: bool,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns the text reported for a failed invocation.
    ///
    /// Linters print their findings on stdout; stderr is only used when
    /// stdout has nothing to say.
    #[must_use]
    pub fn report(&self) -> String {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim().to_string()
        } else {
            stdout.to_string()
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Timeout for the command.
    pub timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Launches external commands on behalf of the check runners.
///
/// An `Err` means the command never ran (see [`Error::ToolLaunch`]); a command
/// that ran and failed is an `Ok` output with a non-zero exit code.
pub trait CommandExecutor: Send + Sync {
    /// Runs `command` to completion.
    fn execute(
        &self,
        command: &CommandLine,
        options: &ExecuteOptions,
    ) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Executor backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }

    /// Waits for the command to exit while draining both pipes.
    ///
    /// Output is read as raw bytes so a tool printing non-UTF-8 text (e.g. a
    /// Latin-1 source excerpt) keeps its pipe open and its own exit status.
    async fn wait_for_output(
        &self,
        child: &mut tokio::process::Child,
    ) -> Result<(i32, String, String)> {
        let stdout_handle = tokio::spawn(drain(child.stdout.take()));
        let stderr_handle = tokio::spawn(drain(child.stderr.take()));

        let status = child.wait().await.map_err(|e| Error::io("wait for command", e))?;

        let stdout = stdout_handle.await.map_err(|e| Error::Internal {
            message: format!("stdout task failed: {e}"),
        })?;
        let stderr = stderr_handle.await.map_err(|e| Error::Internal {
            message: format!("stderr task failed: {e}"),
        })?;

        Ok((status.code().unwrap_or(1), stdout, stderr))
    }
}

/// Reads a pipe to its end and decodes it lossily.
async fn drain<R>(pipe: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut bytes).await {
            tracing::debug!(error = %e, "pipe closed early");
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

impl CommandExecutor for Executor {
    async fn execute(
        &self,
        command: &CommandLine,
        options: &ExecuteOptions,
    ) -> Result<CommandOutput> {
        let start = std::time::Instant::now();
        let program = resolve_program(&command.program, options.cwd.as_deref());

        let mut cmd = Command::new(&program);
        cmd.args(&command.args);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(command = %command, "spawning");

        let mut child = cmd.spawn().map_err(|source| Error::ToolLaunch {
            program: command.program.clone(),
            source,
        })?;

        let result = if let Some(timeout_duration) = options.timeout {
            match timeout(timeout_duration, self.wait_for_output(&mut child)).await
            {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        command = %command,
                        timeout = %humantime::format_duration(timeout_duration),
                        "command timed out, killing it"
                    );
                    drop(child.kill().await);
                    return Ok(CommandOutput {
                        exit_code: TIMEOUT_EXIT_CODE,
                        stdout: String::new(),
                        stderr: "Command timed out".to_string(),
                        timed_out: true,
                        duration: start.elapsed(),
                    });
                },
            }
        } else {
            self.wait_for_output(&mut child).await
        };

        let (exit_code, stdout, stderr) = result?;

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration: start.elapsed(),
        })
    }
}

/// Anchors relative program paths such as `vendor/bin/twigcs` to the working
/// directory. Bare names are left for PATH lookup.
fn resolve_program(program: &str, cwd: Option<&Path>) -> PathBuf {
    let path = Path::new(program);
    match cwd {
        Some(cwd) if path.is_relative() && path.components().count() > 1 => cwd.join(path),
        _ => path.to_path_buf(),
    }
}
