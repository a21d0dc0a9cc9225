//! Command-line interface for code-quality-tool.
//!
//! This module provides the `cqt` CLI with subcommands for:
//! - `run`: Run the enabled checks on the staged files (the default)
//! - `init`: Create a configuration file
//! - `install`: Install the git pre-commit hook
//! - `uninstall`: Remove the git pre-commit hook
//! - `list`: List the available checks
//! - `validate`: Validate configuration
//! - `config`: Show the configuration file

mod commands;

use crate::checks::CheckKind;
use crate::core::error::Result;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pre-commit quality gate for PHP projects.
#[derive(Debug, Parser)]
#[command(
    name = "cqt",
    author,
    version,
    about = "Pre-commit quality gate for PHP projects",
    long_about = r#"
code-quality-tool (cqt) runs PHP and Twig linters against the files staged
for commit, and rejects the commit when one of them reports violations.

Checks are switched on in git_hooks.toml:

  [git_hooks]
  phpLint = true
  phpCsFixer = true
  phpCs = true
  phpMd = true
  twigCs = true
  ignore_folder = ["vendor/", "var/"]

Quick start:
  cqt init --preset symfony   # Create configuration
  cqt install                 # Install git hook

Environment variables:
  CQT_SKIP=1                  Skip all checks
  CQT_CONFIG=<path>           Use this configuration file
  CQT_LOG=<filter>            Log filter (e.g. debug)
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "CQT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RunArgs {
    /// Run only this check (e.g. phpLint).
    #[arg(short, long, value_parser = check_names())]
    pub check: Option<String>,

    /// Check these files instead of the staged ones.
    #[arg(long, num_args = 1..)]
    pub files: Vec<String>,

    /// Print the verdict as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the enabled checks.
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Create a configuration file.
    #[command(visible_alias = "i")]
    Init {
        /// Use a preset configuration.
        #[arg(short, long, value_parser = preset_names())]
        preset: Option<String>,

        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Install the git pre-commit hook.
    Install {
        /// Overwrite existing hook.
        #[arg(short, long)]
        force: bool,
    },

    /// Remove the git pre-commit hook.
    Uninstall,

    /// List the available checks and whether they are enabled.
    #[command(visible_alias = "l")]
    List,

    /// Validate the configuration file.
    #[command(visible_alias = "v")]
    Validate,

    /// Show configuration file location and contents.
    Config {
        /// Output raw TOML.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Accepted values of `run --check`, in execution order.
fn check_names() -> PossibleValuesParser {
    PossibleValuesParser::new(CheckKind::ALL.iter().map(|kind| kind.name()))
}

/// Accepted values of `init --preset`.
fn preset_names() -> PossibleValuesParser {
    PossibleValuesParser::new(crate::presets::available().iter().copied())
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(log_level(cli.verbose, cli.quiet));
    cli.color.apply();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Run(args)) => commands::run(config_path, &args, cli.quiet),
        Some(Commands::Init { preset, force }) => commands::init(preset.as_deref(), force),
        Some(Commands::Install { force }) => commands::install(force),
        Some(Commands::Uninstall) => commands::uninstall(),
        Some(Commands::List) => commands::list(config_path),
        Some(Commands::Validate) => commands::validate(config_path),
        Some(Commands::Config { raw }) => commands::config(config_path, raw),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        // The hook script calls `cqt run`, bare `cqt` does the same.
        None => commands::run(config_path, &RunArgs::default(), cli.quiet),
    }
}

/// Environment variable overriding the log filter, e.g. `CQT_LOG=debug`.
const LOG_ENV: &str = "CQT_LOG";

/// Default log level for the verbosity flags. `--quiet` wins over `--verbose`.
const fn log_level(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (_, true) => "error",
        (true, false) => "debug",
        (false, false) => "warn",
    }
}

/// Installs the stderr subscriber. `CQT_LOG` takes precedence over `level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

impl ColorChoice {
    /// Forces colors on or off for both streams. `Auto` leaves detection to `console`.
    fn apply(self) {
        let enabled = match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => return,
        };
        console::set_colors_enabled(enabled);
        console::set_colors_enabled_stderr(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_help() {
        // --help causes early exit
        assert!(Cli::try_parse_from(["cqt", "--help"]).is_err());
    }

    #[test]
    fn test_parse_no_subcommand() {
        let cli = Cli::try_parse_from(["cqt"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["cqt", "run"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Run(ref args)) if *args == RunArgs::default()));
    }

    #[test]
    fn test_parse_run_with_check() {
        let cli = Cli::try_parse_from(["cqt", "run", "--check", "phpMd"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Run(RunArgs { check: Some(ref c), .. })) if c == "phpMd"
        ));
    }

    #[test]
    fn test_every_check_name_is_accepted() {
        for kind in CheckKind::ALL {
            let result = Cli::try_parse_from(["cqt", "run", "--check", kind.name()]);
            assert!(result.is_ok(), "Check '{}' should be accepted", kind);
        }
        assert!(Cli::try_parse_from(["cqt", "run", "--check", "phpunit"]).is_err());
    }

    #[test]
    fn test_parse_run_with_files_and_json() {
        let cli = Cli::try_parse_from(["cqt", "run", "--json", "--files", "a.php", "b.twig"])
            .expect("parse");
        let args = match cli.command {
            Some(Commands::Run(args)) => Some(args),
            _ => None,
        }
        .expect("run subcommand");
        assert!(args.json);
        assert_eq!(args.files, ["a.php", "b.twig"]);
    }

    #[test]
    fn test_parse_run_alias() {
        let cli = Cli::try_parse_from(["cqt", "r"]).expect("parse run alias");
        assert!(matches!(cli.command, Some(Commands::Run(_))));
    }

    #[test]
    fn test_parse_init_with_preset_and_force() {
        let cli =
            Cli::try_parse_from(["cqt", "init", "--preset", "symfony", "--force"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::Init {
                preset: Some(_),
                force: true
            })
        ));
    }

    #[test]
    fn test_parse_init_invalid_preset() {
        assert!(Cli::try_parse_from(["cqt", "init", "--preset", "laravel"]).is_err());
    }

    #[test]
    fn test_parse_install_and_uninstall() {
        let cli = Cli::try_parse_from(["cqt", "install", "--force"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Install { force: true })));

        let cli = Cli::try_parse_from(["cqt", "uninstall"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Uninstall)));
    }

    #[test]
    fn test_parse_list_validate_config() {
        assert!(matches!(
            Cli::try_parse_from(["cqt", "l"]).expect("parse").command,
            Some(Commands::List)
        ));
        assert!(matches!(
            Cli::try_parse_from(["cqt", "validate"]).expect("parse").command,
            Some(Commands::Validate)
        ));
        assert!(matches!(
            Cli::try_parse_from(["cqt", "config", "--raw"]).expect("parse").command,
            Some(Commands::Config { raw: true })
        ));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["cqt", "completions", "zsh"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "cqt",
            "--config",
            "ci/git_hooks.toml",
            "-q",
            "--color",
            "never",
            "run",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("ci/git_hooks.toml")));
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_color_choice_default() {
        assert_eq!(ColorChoice::default(), ColorChoice::Auto);
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(false, false), "warn");
        assert_eq!(log_level(true, false), "debug");
        assert_eq!(log_level(false, true), "error");
        assert_eq!(log_level(true, true), "error");
    }
}
