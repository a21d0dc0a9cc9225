//! Progress and diagnostics output.
//!
//! The runner only talks to the [`Reporter`] trait. [`ConsoleReporter`] is
//! what the CLI uses; [`SilentReporter`] discards everything.

use crate::checks::{CheckDescriptor, CheckResult, DiagnosticKind};
use crate::core::runner::RunVerdict;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Receives pipeline events in the order they happen.
pub trait Reporter {
    /// The run started.
    fn started(&self) {}

    /// The change set was collected and filtered.
    fn files_collected(&self, _kept: usize, _ignored: usize) {}

    /// A check is about to run.
    fn check_started(&self, _check: &CheckDescriptor) {}

    /// A check completed.
    fn check_finished(&self, _result: &CheckResult) {}

    /// Every planned check ran, or the run stopped at a failure.
    fn finished(&self, _verdict: &RunVerdict) {}
}

/// Reporter that prints nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Reporter printing colored progress to stderr.
#[derive(Debug)]
pub struct ConsoleReporter {
    quiet: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    /// Creates a console reporter. `quiet` keeps only failure output.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(pb);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn started(&self) {
        if self.quiet {
            return;
        }
        eprintln!("{}", style(" Code Quality Tool ").white().bold().on_red());
        eprintln!("{}", style("Fetching files").green());
    }

    fn files_collected(&self, kept: usize, ignored: usize) {
        if self.quiet {
            return;
        }
        if ignored > 0 {
            eprintln!(
                "{} {kept} file(s) to check, {ignored} ignored",
                style("•").cyan()
            );
        } else {
            eprintln!("{} {kept} file(s) to check", style("•").cyan());
        }
    }

    fn check_started(&self, check: &CheckDescriptor) {
        if self.quiet {
            return;
        }
        eprintln!("{}", style(&check.description).green());
        self.start_spinner(format!("Running {}...", check.name()));
    }

    fn check_finished(&self, result: &CheckResult) {
        self.stop_spinner();

        if result.passed {
            if !self.quiet {
                let detail = if result.skipped {
                    "no matching files".to_string()
                } else {
                    format!("{} file(s)", result.files)
                };
                eprintln!("{} {} ({detail})", style("✓").green(), result.name);
            }
            return;
        }

        eprintln!("{} {}", style("✗").red(), result.name);
        for diagnostic in &result.diagnostics {
            eprintln!("  {}", style(&diagnostic.file).bold());
            let label = match diagnostic.kind {
                DiagnosticKind::Violations => None,
                DiagnosticKind::LaunchFailed => Some("could not run tool:"),
                DiagnosticKind::TimedOut => Some("tool did not finish:"),
            };
            if let Some(label) = label {
                eprintln!("    {}", style(label).yellow());
            }
            for line in diagnostic.message.lines() {
                eprintln!("    {}", style(line).red());
            }
        }
    }

    fn finished(&self, verdict: &RunVerdict) {
        if self.quiet {
            return;
        }
        eprintln!();
        eprintln!(
            "{} passed, {} failed, {} skipped in {}",
            verdict.passed_count(),
            verdict.failed_count(),
            verdict.skipped_count(),
            humantime::format_duration(Duration::from_millis(
                u64::try_from(verdict.duration.as_millis()).unwrap_or(u64::MAX)
            ))
        );
        if let Some(note) = tool_error_note(verdict) {
            eprintln!("{}", style(note).yellow());
        }
    }
}

/// Tells tool problems apart from violations: a failure that comes from a
/// linter that could not run or did not finish is worth a separate hint.
fn tool_error_note(verdict: &RunVerdict) -> Option<String> {
    let count: usize = verdict.checks.iter().map(|c| c.tool_errors().count()).sum();
    match count {
        0 => None,
        1 => Some("1 tool invocation could not run or did not finish".to_string()),
        n => Some(format!("{n} tool invocations could not run or did not finish")),
    }
}
