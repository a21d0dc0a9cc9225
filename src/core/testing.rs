//! Test doubles for driving checks without spawning processes.

use crate::checks::{CheckDescriptor, CheckResult};
use crate::core::error::{Error, Result};
use crate::core::executor::{CommandExecutor, CommandLine, CommandOutput, ExecuteOptions};
use crate::core::report::Reporter;
use crate::core::runner::RunVerdict;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Response {
    Fail(String),
    Unlaunchable,
    Hang,
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    file: Option<String>,
    response: Response,
}

/// Records every command and answers from a rule list. Unmatched commands pass.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandLine>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` fail on `file` with `stdout`.
    pub fn fail(mut self, needle: &str, file: &str, stdout: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            file: Some(file.to_string()),
            response: Response::Fail(stdout.to_string()),
        });
        self
    }

    /// Commands containing `needle` cannot be launched.
    pub fn unlaunchable(mut self, needle: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            file: None,
            response: Response::Unlaunchable,
        });
        self
    }

    /// Commands containing `needle` time out on `file`.
    pub fn hang(mut self, needle: &str, file: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            file: Some(file.to_string()),
            response: Response::Hang,
        });
        self
    }

    /// Every command takes `latency` to answer.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of commands that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn invocations(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn respond(&self, command: &CommandLine) -> Option<Response> {
        let rendered = command.to_string();
        self.rules
            .iter()
            .find(|rule| {
                rendered.contains(&rule.needle)
                    && rule
                        .file
                        .as_ref()
                        .map_or(true, |file| command.args.contains(file))
            })
            .map(|rule| rule.response.clone())
    }
}

impl CommandExecutor for FakeExecutor {
    async fn execute(
        &self,
        command: &CommandLine,
        _options: &ExecuteOptions,
    ) -> Result<CommandOutput> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(command.clone());

        if let Some(latency) = self.latency {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let output = |exit_code, stdout: String, timed_out| CommandOutput {
            exit_code,
            stdout,
            stderr: String::new(),
            timed_out,
            duration: Duration::ZERO,
        };

        match self.respond(command) {
            None => Ok(output(0, String::new(), false)),
            Some(Response::Fail(stdout)) => Ok(output(1, stdout, false)),
            Some(Response::Hang) => Ok(output(124, String::new(), true)),
            Some(Response::Unlaunchable) => Err(Error::ToolLaunch {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
            }),
        }
    }
}

/// Reporter that records events as strings.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl Reporter for RecordingReporter {
    fn files_collected(&self, kept: usize, ignored: usize) {
        self.push(format!("files {kept} (ignored {ignored})"));
    }

    fn check_started(&self, check: &CheckDescriptor) {
        self.push(format!("start {}", check.name()));
    }

    fn check_finished(&self, result: &CheckResult) {
        let outcome = if result.skipped {
            "skipped"
        } else if result.passed {
            "passed"
        } else {
            "failed"
        };
        self.push(format!("{outcome} {}", result.name));
    }

    fn finished(&self, verdict: &RunVerdict) {
        self.push(format!("verdict {}", verdict.success()));
    }
}
