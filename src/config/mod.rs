//! Configuration handling for code-quality-tool.
//!
//! The configuration lives in `git_hooks.toml` at the project root:
//!
//! ```toml
//! [git_hooks]
//! phpLint = true
//! phpCs = true
//! twigCs = false
//! ignore_folder = ["vendor/", "var/"]
//! ```
//!
//! Missing flags mean "disabled" and a missing folder list means "ignore
//! nothing". A missing or unparsable file is fatal.

use crate::checks::{CheckDescriptor, CheckKind};
use crate::core::classifier::IgnoreRule;
use crate::core::error::{Error, Result};
use crate::presets;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "git_hooks.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The `[git_hooks]` table.
    pub git_hooks: HooksConfig,
}

/// Check switches and run policy.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HooksConfig {
    /// Run `php -l`.
    #[serde(rename = "phpLint")]
    pub php_lint: bool,
    /// Run php-cs-fixer in dry-run mode.
    #[serde(rename = "phpCsFixer")]
    pub php_cs_fixer: bool,
    /// Run PHP_CodeSniffer.
    #[serde(rename = "phpCs")]
    pub php_cs: bool,
    /// Run PHPMD.
    #[serde(rename = "phpMd")]
    pub php_md: bool,
    /// Run twigcs.
    #[serde(rename = "twigCs")]
    pub twig_cs: bool,
    /// Path prefixes excluded from every check.
    pub ignore_folder: Vec<String>,
    /// Stop at the first failing check.
    pub fail_fast: bool,
    /// Limit for a single tool invocation (humantime syntax).
    pub timeout: String,
    /// Files checked concurrently within one check.
    pub jobs: usize,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            php_lint: false,
            php_cs_fixer: false,
            php_cs: false,
            php_md: false,
            twig_cs: false,
            ignore_folder: Vec::new(),
            fail_fast: true,
            timeout: "5m".to_string(),
            jobs: 1,
        }
    }
}

impl HooksConfig {
    /// Returns whether a check is switched on.
    #[must_use]
    pub const fn is_enabled(&self, kind: CheckKind) -> bool {
        match kind {
            CheckKind::PhpLint => self.php_lint,
            CheckKind::StyleFixer => self.php_cs_fixer,
            CheckKind::StylePsr => self.php_cs,
            CheckKind::MessDetector => self.php_md,
            CheckKind::TemplateStyle => self.twig_cs,
        }
    }

    /// Switches a check on or off.
    pub fn set_enabled(&mut self, kind: CheckKind, enabled: bool) {
        let flag = match kind {
            CheckKind::PhpLint => &mut self.php_lint,
            CheckKind::StyleFixer => &mut self.php_cs_fixer,
            CheckKind::StylePsr => &mut self.php_cs,
            CheckKind::MessDetector => &mut self.php_md,
            CheckKind::TemplateStyle => &mut self.twig_cs,
        };
        *flag = enabled;
    }

    /// Enables `kind` and disables every other check.
    pub fn only(&mut self, kind: CheckKind) {
        for other in CheckKind::ALL {
            self.set_enabled(other, other == kind);
        }
    }
}

impl Config {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;
        let config = Self::parse(&content)?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Finds the configuration file by searching up from the current directory.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        Self::find_config_file_from(&cwd)
    }

    /// Finds the configuration file by searching up from `start`.
    pub fn find_config_file_from(start: &Path) -> Result<PathBuf> {
        let mut current = start;
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: start.join(CONFIG_FILE_NAME),
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let hooks = &self.git_hooks;

        if humantime::parse_duration(&hooks.timeout).is_err() {
            return Err(Error::config_invalid(
                "git_hooks.timeout",
                format!("Invalid duration: {}", hooks.timeout),
            ));
        }

        if hooks.jobs == 0 {
            return Err(Error::config_invalid(
                "git_hooks.jobs",
                "must be at least 1",
            ));
        }

        self.ignore_rule()?;

        Ok(())
    }

    /// Compiles the ignore folders. `None` when nothing is ignored.
    pub fn ignore_rule(&self) -> Result<Option<IgnoreRule>> {
        IgnoreRule::compile(&self.git_hooks.ignore_folder)
    }

    /// Returns the per-invocation timeout.
    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.git_hooks.timeout).map_err(|e| {
            Error::config_invalid("git_hooks.timeout", format!("Invalid duration: {e}"))
        })
    }

    /// Returns every check with its enabled state, in execution order.
    #[must_use]
    pub fn checks(&self) -> Vec<CheckDescriptor> {
        CheckKind::ALL
            .into_iter()
            .map(|kind| CheckDescriptor::new(kind, self.git_hooks.is_enabled(kind)))
            .collect()
    }

    /// Returns the enabled checks, in execution order.
    #[must_use]
    pub fn enabled_checks(&self) -> Vec<CheckDescriptor> {
        self.checks().into_iter().filter(|c| c.enabled).collect()
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })
    }

    /// Generates configuration for a specific preset.
    #[must_use]
    pub fn for_preset(preset: &str) -> Self {
        let mut config = Self::default();
        let hooks = &mut config.git_hooks;

        match preset {
            presets::names::MINIMAL => {
                hooks.php_lint = true;
            },
            presets::names::PHP => {
                hooks.php_lint = true;
                hooks.php_cs = true;
                hooks.php_md = true;
                hooks.ignore_folder = vec!["vendor/".to_string()];
            },
            presets::names::SYMFONY => {
                for kind in CheckKind::ALL {
                    hooks.set_enabled(kind, true);
                }
                hooks.ignore_folder = vec!["vendor/".to_string(), "var/".to_string()];
            },
            _ => {},
        }

        config
    }
}
