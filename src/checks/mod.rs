//! Checks and the runner that executes one check against a file set.
//!
//! A check runs its tool once per qualifying file. All failing files are
//! reported, even though the pipeline stops at the first failing check.

pub mod builtin;

pub use builtin::CheckKind;

use crate::core::classifier::{ContentType, FileSet};
use crate::core::executor::{CommandExecutor, CommandLine, ExecuteOptions};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// An enabled or disabled check, as planned from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDescriptor {
    /// Which built-in check this is.
    pub kind: CheckKind,
    /// Whether the configuration enables it.
    pub enabled: bool,
    /// Progress message.
    pub description: String,
    /// Files the check looks at.
    pub file_type: ContentType,
    /// Message the run fails with.
    pub failure_message: String,
}

impl CheckDescriptor {
    /// Creates the descriptor of a built-in check.
    #[must_use]
    pub fn new(kind: CheckKind, enabled: bool) -> Self {
        Self {
            kind,
            enabled,
            description: kind.description().to_string(),
            file_type: kind.file_type(),
            failure_message: kind.failure_message().to_string(),
        }
    }

    /// Returns the check's configuration key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Why an invocation counts as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The tool ran and reported violations.
    Violations,
    /// The tool could not be started.
    LaunchFailed,
    /// The tool was killed after the invocation timeout.
    TimedOut,
}

/// Output of one failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// File the tool was run on.
    pub file: String,
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Captured text.
    pub message: String,
}

impl Diagnostic {
    /// Violations reported by the tool.
    pub fn violations(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: DiagnosticKind::Violations,
            message: message.into(),
        }
    }

    /// The tool could not run.
    pub fn launch_failed(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind: DiagnosticKind::LaunchFailed,
            message: message.into(),
        }
    }

    /// The tool did not finish in time.
    pub fn timed_out(file: impl Into<String>, limit: Option<Duration>) -> Self {
        let message = match limit {
            Some(limit) => format!("timed out after {}", humantime::format_duration(limit)),
            None => "timed out".to_string(),
        };
        Self {
            file: file.into(),
            kind: DiagnosticKind::TimedOut,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Violations => write!(f, "{}: {}", self.file, self.message),
            DiagnosticKind::LaunchFailed => {
                write!(f, "{}: could not run tool: {}", self.file, self.message)
            },
            DiagnosticKind::TimedOut => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

/// Result of running a single check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// True when no file matched the check's type and nothing ran.
    pub skipped: bool,
    /// Number of files the tool was run on.
    pub files: usize,
    /// Diagnostics of every failed invocation, in file order.
    pub diagnostics: Vec<Diagnostic>,
    /// Message the run fails with if this check failed.
    pub failure_message: String,
    /// Time spent in the check.
    #[serde(skip)]
    pub duration: Duration,
}

impl CheckResult {
    /// Creates a skipped check result.
    fn skipped(check: &CheckDescriptor) -> Self {
        Self {
            name: check.name().to_string(),
            passed: true,
            skipped: true,
            files: 0,
            diagnostics: Vec::new(),
            failure_message: check.failure_message.clone(),
            duration: Duration::ZERO,
        }
    }

    /// Returns diagnostics that come from a tool that could not run.
    pub fn tool_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind != DiagnosticKind::Violations)
    }
}

/// Runs one check against a file set.
#[derive(Debug)]
pub struct CheckRunner<'a, E> {
    check: &'a CheckDescriptor,
    executor: &'a Arc<E>,
    options: &'a ExecuteOptions,
    jobs: usize,
}

impl<'a, E> CheckRunner<'a, E>
where
    E: CommandExecutor + 'static,
{
    /// Creates a runner for `check`.
    pub fn new(check: &'a CheckDescriptor, executor: &'a Arc<E>, options: &'a ExecuteOptions) -> Self {
        Self {
            check,
            executor,
            options,
            jobs: 1,
        }
    }

    /// Allows up to `jobs` invocations of this check at once.
    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Runs the check on the files of its content type.
    pub async fn invoke(&self, files: &FileSet) -> CheckResult {
        let relevant = files.of_type(self.check.file_type);

        if relevant.is_empty() {
            tracing::debug!(check = self.check.name(), "no matching files, skipping");
            return CheckResult::skipped(self.check);
        }

        let start = Instant::now();
        let diagnostics = if self.jobs > 1 && relevant.len() > 1 {
            self.invoke_concurrently(&relevant).await
        } else {
            self.invoke_sequentially(&relevant).await
        };

        tracing::debug!(
            check = self.check.name(),
            files = relevant.len(),
            failures = diagnostics.len(),
            "check finished"
        );

        CheckResult {
            name: self.check.name().to_string(),
            passed: diagnostics.is_empty(),
            skipped: false,
            files: relevant.len(),
            diagnostics,
            failure_message: self.check.failure_message.clone(),
            duration: start.elapsed(),
        }
    }

    async fn invoke_sequentially(&self, files: &[&str]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for file in files {
            let command = self.check.kind.command_for(file);
            if let Some(diagnostic) =
                invoke_file(self.executor.as_ref(), file, &command, self.options).await
            {
                diagnostics.push(diagnostic);
            }
        }

        diagnostics
    }

    /// Runs the files in parallel, collecting outcomes in file order.
    async fn invoke_concurrently(&self, files: &[&str]) -> Vec<Diagnostic> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let sem = Arc::clone(&semaphore);
            let executor = Arc::clone(self.executor);
            let options = self.options.clone();
            let command = self.check.kind.command_for(file);
            let file = (*file).to_string();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return Some(Diagnostic::launch_failed(file, "semaphore closed unexpectedly"));
                };
                invoke_file(executor.as_ref(), &file, &command, &options).await
            }));
        }

        let mut diagnostics = Vec::new();
        for (handle, file) in handles.into_iter().zip(files) {
            match handle.await {
                Ok(Some(diagnostic)) => diagnostics.push(diagnostic),
                Ok(None) => {},
                Err(e) => diagnostics.push(Diagnostic::launch_failed(
                    *file,
                    format!("invocation task failed: {e}"),
                )),
            }
        }

        diagnostics
    }
}

/// Runs the tool on one file. Returns `None` when the file is clean.
async fn invoke_file<E: CommandExecutor>(
    executor: &E,
    file: &str,
    command: &CommandLine,
    options: &ExecuteOptions,
) -> Option<Diagnostic> {
    match executor.execute(command, options).await {
        Ok(output) if output.success() => None,
        Ok(output) if output.timed_out => Some(Diagnostic::timed_out(file, options.timeout)),
        Ok(output) => Some(Diagnostic::violations(file, output.report())),
        Err(e) => {
            tracing::warn!(command = %command, error = %e, "tool could not run");
            Some(Diagnostic::launch_failed(file, e.to_string()))
        },
    }
}
