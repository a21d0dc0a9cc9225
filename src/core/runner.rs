//! Pipeline orchestration.
//!
//! The [`Runner`] turns a change set and the configuration into a
//! [`RunVerdict`]: it strips ignored folders, runs every enabled check in
//! declaration order and stops at the first failure unless fail-all is
//! configured. Check failures are part of the verdict, not errors; only
//! configuration and change-set problems abort the run with `Err`.

use crate::checks::{CheckDescriptor, CheckResult, CheckRunner};
use crate::config::Config;
use crate::core::classifier::FileSet;
use crate::core::error::{Error, Result};
use crate::core::executor::{CommandExecutor, ExecuteOptions, Executor};
use crate::core::git::ChangeSetProvider;
use crate::core::report::Reporter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of running all checks.
#[derive(Debug, Serialize)]
pub struct RunVerdict {
    /// Results of the checks that ran, in execution order.
    pub checks: Vec<CheckResult>,
    /// Files left after ignore filtering.
    pub files: usize,
    /// Files dropped by the ignore rule.
    pub ignored: usize,
    /// Whether the run stopped at the first failure.
    pub fail_fast: bool,
    /// Total duration.
    #[serde(skip)]
    pub duration: Duration,
}

impl RunVerdict {
    /// Returns true if all checks passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Returns the number of checks that ran and passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.passed && !c.skipped)
            .count()
    }

    /// Returns the number of failed checks.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Returns the number of checks with no matching files.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.checks.iter().filter(|c| c.skipped).count()
    }

    /// Returns failed check results.
    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Converts a failing verdict into the terminal error of the run.
    pub fn ensure_passed(&self) -> Result<()> {
        let failed: Vec<&CheckResult> = self.failed_checks().collect();

        match failed.as_slice() {
            [] => Ok(()),
            [only] => Err(Error::check_failed(&only.name, &only.failure_message)),
            many => Err(Error::ChecksFailed {
                names: many.iter().map(|c| c.name.clone()).collect(),
                messages: many.iter().map(|c| c.failure_message.clone()).collect(),
            }),
        }
    }
}

/// Runner for executing checks.
#[derive(Debug)]
pub struct Runner<E = Executor> {
    config: Config,
    root: PathBuf,
    executor: Arc<E>,
}

impl Runner<Executor> {
    /// Creates a runner that launches real processes from `root`.
    #[must_use]
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Self {
        Self::with_executor(config, root, Executor::new())
    }
}

impl<E> Runner<E>
where
    E: CommandExecutor + 'static,
{
    /// Creates a runner with a specific executor.
    #[must_use]
    pub fn with_executor(config: Config, root: impl Into<PathBuf>, executor: E) -> Self {
        Self {
            config,
            root: root.into(),
            executor: Arc::new(executor),
        }
    }

    /// Returns the directory tools run in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the enabled checks in the order they will run.
    #[must_use]
    pub fn plan(&self) -> Vec<CheckDescriptor> {
        self.config.enabled_checks()
    }

    /// Runs every enabled check against the provider's change set.
    pub async fn run<P, R>(&self, provider: &P, reporter: &R) -> Result<RunVerdict>
    where
        P: ChangeSetProvider + ?Sized,
        R: Reporter + ?Sized,
    {
        let start = Instant::now();
        reporter.started();

        let raw = provider.changed_files()?;
        let files = match self.config.ignore_rule()? {
            Some(rule) => raw.without_ignored(&rule),
            None => raw.clone(),
        };
        let ignored = raw.len() - files.len();
        reporter.files_collected(files.len(), ignored);
        tracing::debug!(files = files.len(), ignored, "change set ready");

        let options = ExecuteOptions::default()
            .cwd(&self.root)
            .timeout(self.config.timeout()?);

        let checks = self.run_checks(&files, &options, reporter).await;

        let verdict = RunVerdict {
            checks,
            files: files.len(),
            ignored,
            fail_fast: self.config.git_hooks.fail_fast,
            duration: start.elapsed(),
        };
        reporter.finished(&verdict);

        Ok(verdict)
    }

    async fn run_checks<R>(
        &self,
        files: &FileSet,
        options: &ExecuteOptions,
        reporter: &R,
    ) -> Vec<CheckResult>
    where
        R: Reporter + ?Sized,
    {
        let plan = self.plan();
        let mut results = Vec::with_capacity(plan.len());

        for check in &plan {
            reporter.check_started(check);

            let result = CheckRunner::new(check, &self.executor, options)
                .jobs(self.config.git_hooks.jobs)
                .invoke(files)
                .await;

            reporter.check_finished(&result);

            let failed = !result.passed;
            results.push(result);

            if failed && self.config.git_hooks.fail_fast {
                tracing::info!(check = check.name(), "check failed, stopping");
                break;
            }
        }

        results
    }
}
