//! Error types for code-quality-tool.
//!
//! Check failures are not errors while the pipeline runs: they live inside the
//! [`RunVerdict`](crate::core::runner::RunVerdict) and only become an [`Error`]
//! once the verdict is turned into the terminal outcome of the process.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for a configuration problem (`EX_CONFIG`).
const EXIT_CONFIG: u8 = 78;

/// Exit status when the change set cannot be read (`EX_DATAERR`).
const EXIT_GIT: u8 = 65;

/// Everything that can stop a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // -- configuration ------------------------------------------------------
    /// No `git_hooks.toml` where one was expected.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// What went wrong.
        message: String,
        /// Underlying deserializer error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration value is out of range or unusable.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Dotted key of the offending value, e.g. `git_hooks.jobs`.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    // -- change set ---------------------------------------------------------
    /// The working directory is outside any repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// A git plumbing command exited non-zero.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// The git subcommand, e.g. `diff-index`.
        operation: String,
        /// Trimmed stderr of git.
        message: String,
    },

    // -- verdict ------------------------------------------------------------
    /// One check reported violations. Displays as the check's failure message.
    #[error("{message}")]
    CheckFailed {
        /// Check name, e.g. `phpLint`.
        name: String,
        /// The check's failure message.
        message: String,
    },

    /// Several checks reported violations (`fail_fast = false`).
    #[error("{} checks failed: {}", names.len(), messages.join(" "))]
    ChecksFailed {
        /// Failing check names in execution order.
        names: Vec<String>,
        /// Failure messages, parallel to `names`.
        messages: Vec<String>,
    },

    /// A linter binary could not be started.
    #[error("Failed to launch '{program}': {source}")]
    ToolLaunch {
        /// Program as written in the command template.
        program: String,
        /// Spawn error.
        #[source]
        source: std::io::Error,
    },

    // -- hook management ----------------------------------------------------
    /// Writing the pre-commit hook failed.
    #[error("Failed to install Git hook: {message}")]
    HookInstall {
        /// What went wrong.
        message: String,
    },

    /// A pre-commit hook written by something else is in the way.
    #[error("Git hook already exists at {path}. Use --force to overwrite.")]
    HookExists {
        /// Location of the foreign hook.
        path: PathBuf,
    },

    // -- other --------------------------------------------------------------
    /// Filesystem or process I/O failed.
    #[error("I/O error: {message}")]
    Io {
        /// The operation that failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    /// A bug or an environment failure outside the user's control.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Wraps a deserializer error as a parse failure.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Rejects the value of `field`.
    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attaches the name of the failed operation to an I/O error.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Reports a failed git subcommand.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// The terminal error of a run stopped by check `name`.
    pub fn check_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CheckFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true for problems with `git_hooks.toml`.
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::ConfigInvalid { .. }
        )
    }

    /// Returns the process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_config_error() {
            return EXIT_CONFIG;
        }
        match self {
            Self::NotGitRepo | Self::GitOperation { .. } => EXIT_GIT,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::error::Error as StdError;

    fn parse_error() -> Error {
        let toml_err = toml::from_str::<toml::Value>("phpLint = [").expect_err("invalid toml");
        Error::config_parse_with_source("Failed to parse TOML", toml_err)
    }

    #[rstest]
    #[case(
        Error::ConfigNotFound { path: PathBuf::from("/project/git_hooks.toml") },
        "Configuration file not found: /project/git_hooks.toml"
    )]
    #[case(
        Error::config_invalid("git_hooks.timeout", "Invalid duration: soon"),
        "Invalid configuration: git_hooks.timeout - Invalid duration: soon"
    )]
    #[case(
        Error::git("diff-index", "bad revision"),
        "Git operation failed: diff-index - bad revision"
    )]
    #[case(
        Error::check_failed("phpLint", "There are some PHP syntax errors!"),
        "There are some PHP syntax errors!"
    )]
    #[case(
        Error::HookExists { path: PathBuf::from(".git/hooks/pre-commit") },
        "Git hook already exists at .git/hooks/pre-commit. Use --force to overwrite."
    )]
    #[case(
        Error::io("read config", std::io::Error::other("file not found")),
        "I/O error: read config"
    )]
    fn test_display(#[case] err: Error, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_checks_failed_lists_every_message() {
        let err = Error::ChecksFailed {
            names: vec!["phpLint".into(), "phpMd".into()],
            messages: vec![
                "There are some PHP syntax errors!".into(),
                "There are PHPMD violations!".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 checks failed: There are some PHP syntax errors! There are PHPMD violations!"
        );
    }

    #[test]
    fn test_tool_launch_keeps_spawn_error() {
        let err = Error::ToolLaunch {
            program: "php".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "Failed to launch 'php': not found");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let err = parse_error();
        assert!(err.to_string().starts_with("Failed to parse configuration"));
        assert!(err.source().is_some());
    }

    #[rstest]
    #[case(parse_error(), 78)]
    #[case(Error::config_invalid("git_hooks.jobs", "must be at least 1"), 78)]
    #[case(Error::ConfigNotFound { path: PathBuf::from("git_hooks.toml") }, 78)]
    #[case(Error::NotGitRepo, 65)]
    #[case(Error::git("diff-index", "fatal"), 65)]
    #[case(Error::check_failed("twigCs", "There are twig code style violations!"), 1)]
    #[case(Error::Internal { message: "runtime".into() }, 1)]
    fn test_exit_codes(#[case] err: Error, #[case] expected: u8) {
        assert_eq!(err.exit_code(), expected);
    }

    #[test]
    fn test_is_config_error() {
        assert!(parse_error().is_config_error());
        assert!(!Error::NotGitRepo.is_config_error());
        assert!(!Error::check_failed("phpCs", "x").is_config_error());
    }
}
