//! CLI command implementations.

use crate::checks::CheckKind;
use crate::cli::RunArgs;
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::core::classifier::FileSet;
use crate::core::error::{Error, Result};
use crate::core::executor::Executor;
use crate::core::git::GitRepo;
use crate::core::report::ConsoleReporter;
use crate::core::runner::Runner;
use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Hook script template.
const HOOK_SCRIPT: &str = r#"#!/bin/sh
# code-quality-tool hook - installed by `cqt install`

# Skip if CQT_SKIP is set
if [ "$CQT_SKIP" = "1" ]; then
    exit 0
fi

exec cqt run
"#;

/// Hook marker comment.
const HOOK_MARKER: &str = "# code-quality-tool hook";

/// Loads the configuration from `path` or by searching upward.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Run checks.
pub fn run(config_path: Option<&Path>, args: &RunArgs, quiet: bool) -> Result<ExitCode> {
    if std::env::var("CQT_SKIP").ok().as_deref() == Some("1") {
        eprintln!("{} Skipping checks (CQT_SKIP=1)", style("•").cyan());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = load_config(config_path)?;

    if let Some(name) = args.check.as_deref() {
        let kind: CheckKind = name
            .parse()
            .map_err(|e: String| Error::config_invalid("check", e))?;
        config.git_hooks.only(kind);
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create runtime: {e}"),
    })?;
    let reporter = ConsoleReporter::new(quiet || args.json);

    let verdict = if args.files.is_empty() {
        let repo = GitRepo::discover()?;
        let runner = Runner::new(config, repo.root());
        runtime.block_on(runner.run(&repo, &reporter))?
    } else {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        let root = match GitRepo::discover() {
            Ok(repo) => repo.root().to_path_buf(),
            Err(_) => cwd.clone(),
        };
        let files = args
            .files
            .iter()
            .map(|file| relative_to_root(&root, &cwd, file))
            .collect::<Result<FileSet>>()?;
        let runner = Runner::new(config, root);
        runtime.block_on(runner.run(&files, &reporter))?
    };

    if args.json {
        let json = serde_json::to_string_pretty(&verdict).map_err(|e| Error::Internal {
            message: format!("Failed to serialize verdict: {e}"),
        })?;
        println!("{json}");
    }

    verdict.ensure_passed()?;

    if !quiet && !args.json {
        eprintln!("{}", style("Good job!").green().bold());
    }

    Ok(ExitCode::SUCCESS)
}

/// Rewrites a path typed relative to `cwd` as a path relative to `root`,
/// where the tools run. Paths outside `root` are rejected.
fn relative_to_root(root: &Path, cwd: &Path, file: &str) -> Result<String> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
    let joined = cwd.join(file);
    let absolute = joined.canonicalize().unwrap_or(joined);

    let relative = absolute.strip_prefix(&root).map_err(|_| {
        Error::config_invalid(
            "files",
            format!("{file} is outside the project root {}", root.display()),
        )
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Initialize configuration.
pub fn init(preset: Option<&str>, force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let config = match preset {
        Some(p) => Config::for_preset(p),
        None => {
            let mut config = Config::default();
            config.git_hooks.php_lint = true;
            if PathBuf::from("vendor").is_dir() {
                config.git_hooks.ignore_folder = vec!["vendor/".to_string()];
                eprintln!(
                    "{} Detected vendor/ - adding it to ignore_folder",
                    style("•").cyan()
                );
            }
            config
        },
    };

    std::fs::write(&config_path, config.to_toml()?).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), config_path.display());

    if let Some(p) = preset {
        eprintln!("  Using preset: {p} - {}", crate::presets::description(p));
    }

    eprintln!("\nNext steps:");
    eprintln!("  1. Review and customize {CONFIG_FILE_NAME}");
    eprintln!("  2. Run: cqt install");

    Ok(ExitCode::SUCCESS)
}

/// Name of the hook file under the hooks directory.
const HOOK_NAME: &str = "pre-commit";

/// Returns `Some(true)` if the hook at `path` was written by `cqt install`,
/// `Some(false)` for a foreign hook, `None` when there is no hook.
fn hook_owner(path: &Path) -> Result<Option<bool>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io("read hook", e))?;
    Ok(Some(content.contains(HOOK_MARKER)))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        Error::HookInstall {
            message: format!("cannot make {} executable: {e}", path.display()),
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Install git hook.
pub fn install(force: bool) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hooks_dir = repo.hooks_dir();
    let hook_path = hooks_dir.join(HOOK_NAME);

    match hook_owner(&hook_path)? {
        Some(true) => {
            eprintln!(
                "{} Hook already installed at {}",
                style("✓").green(),
                hook_path.display()
            );
            return Ok(ExitCode::SUCCESS);
        },
        Some(false) if !force => return Err(Error::HookExists { path: hook_path }),
        Some(false) => {
            let backup_path = hooks_dir.join(format!("{HOOK_NAME}.bak"));
            std::fs::rename(&hook_path, &backup_path).map_err(|e| Error::io("backup hook", e))?;
            eprintln!(
                "{} Moved the existing hook to {}",
                style("•").cyan(),
                backup_path.display()
            );
        },
        None => {
            std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io("create hooks dir", e))?;
        },
    }

    std::fs::write(&hook_path, HOOK_SCRIPT).map_err(|e| Error::io("write hook", e))?;
    make_executable(&hook_path)?;

    tracing::debug!(path = %hook_path.display(), "hook written");
    eprintln!(
        "{} Installed pre-commit hook at {}",
        style("✓").green(),
        hook_path.display()
    );

    Ok(ExitCode::SUCCESS)
}

/// Uninstall git hook.
pub fn uninstall() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hook_path = repo.hook_path(HOOK_NAME);

    match hook_owner(&hook_path)? {
        None => {
            eprintln!(
                "{} No hook installed at {}",
                style("•").cyan(),
                hook_path.display()
            );
            return Ok(ExitCode::SUCCESS);
        },
        Some(false) => {
            eprintln!(
                "{} Hook at {} was not installed by cqt, leaving it alone",
                style("!").yellow(),
                hook_path.display()
            );
            return Ok(ExitCode::FAILURE);
        },
        Some(true) => {},
    }

    std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook", e))?;
    eprintln!(
        "{} Removed pre-commit hook from {}",
        style("✓").green(),
        hook_path.display()
    );

    let backup_path = repo.hooks_dir().join(format!("{HOOK_NAME}.bak"));
    if backup_path.exists() {
        eprintln!(
            "  A previous hook is saved at {}",
            backup_path.display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// List the checks in execution order.
pub fn list(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let root = GitRepo::discover()
        .map(|repo| repo.root().to_path_buf())
        .ok();

    eprintln!("{}", style("Checks (in execution order):").bold());
    for check in config.checks() {
        let state = if check.enabled {
            style("enabled ").green()
        } else {
            style("disabled").dim()
        };

        eprintln!(
            "  {state} {} - {} [{} files]",
            style(check.name()).cyan(),
            check.description,
            check.file_type
        );
        eprintln!("           {}", check.kind.command_for("<file>"));

        if check.enabled && !tool_available(check.kind, root.as_deref()) {
            eprintln!(
                "           {} {} not found",
                style("!").yellow(),
                check.kind.program()
            );
        }
    }

    if !config.git_hooks.ignore_folder.is_empty() {
        eprintln!();
        eprintln!("{}", style("Ignored folders:").bold());
        for folder in &config.git_hooks.ignore_folder {
            eprintln!("  {folder}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Returns true if the program a check launches can be found.
fn tool_available(kind: CheckKind, root: Option<&Path>) -> bool {
    let program = kind.program();
    if program.contains('/') {
        root.map_or(false, |root| root.join(program).exists())
    } else {
        Executor::command_exists(program)
    }
}

/// Validate configuration.
pub fn validate(config_path: Option<&Path>) -> Result<ExitCode> {
    match load_config(config_path) {
        Ok(config) => {
            eprintln!(
                "{} Configuration is valid ({} check(s) enabled)",
                style("✓").green(),
                config.enabled_checks().len()
            );
            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: cqt init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            eprintln!("{} Configuration validation failed: {e}", style("✗").red());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Show configuration.
pub fn config(config_path: Option<&Path>, raw: bool) -> Result<ExitCode> {
    let found = match config_path {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        None => Config::find_config_file(),
    };

    match found {
        Ok(path) => {
            eprintln!("Configuration file: {}", path.display());

            if raw {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io("read config", e))?;
                eprintln!();
                std::io::stdout()
                    .write_all(content.as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            }

            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { .. }) => {
            eprintln!("{} No configuration file found", style("!").yellow());
            eprintln!("  Run: cqt init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e),
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "cqt",
        &mut std::io::stdout(),
    );
}
