//! Built-in check definitions.
//!
//! Every check the tool knows about is a [`CheckKind`]. The configuration only
//! switches kinds on and off; the commands themselves are fixed.

use crate::core::classifier::ContentType;
use crate::core::executor::CommandLine;
use std::fmt;
use std::str::FromStr;

/// Configuration keys of the built-in checks.
pub mod names {
    /// PHP syntax check (`php -l`).
    pub const PHP_LINT: &str = "phpLint";
    /// Coding standards with php-cs-fixer.
    pub const PHP_CS_FIXER: &str = "phpCsFixer";
    /// Coding standards with PHP_CodeSniffer.
    pub const PHP_CS: &str = "phpCs";
    /// Mess detection with PHPMD.
    pub const PHP_MD: &str = "phpMd";
    /// Twig template style with twigcs.
    pub const TWIG_CS: &str = "twigCs";
}

/// The fixed set of checks, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// `php -l`.
    PhpLint,
    /// `php-cs-fixer --dry-run`.
    StyleFixer,
    /// `phpcs`.
    StylePsr,
    /// `phpmd`.
    MessDetector,
    /// `twigcs`.
    TemplateStyle,
}

impl CheckKind {
    /// All kinds in declaration order. This is the order checks run in.
    pub const ALL: [Self; 5] = [
        Self::PhpLint,
        Self::StyleFixer,
        Self::StylePsr,
        Self::MessDetector,
        Self::TemplateStyle,
    ];

    /// Returns the configuration key of the check.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PhpLint => names::PHP_LINT,
            Self::StyleFixer => names::PHP_CS_FIXER,
            Self::StylePsr => names::PHP_CS,
            Self::MessDetector => names::PHP_MD,
            Self::TemplateStyle => names::TWIG_CS,
        }
    }

    /// Returns the progress message shown when the check starts.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PhpLint => "Running PHPLint",
            Self::StyleFixer => "Checking code style with php-cs-fixer",
            Self::StylePsr => "Checking code style with PHPCS",
            Self::MessDetector => "Checking code mess with PHPMD",
            Self::TemplateStyle => "Checking twig code style with TWIGCS",
        }
    }

    /// Returns the message the run fails with when this check fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::PhpLint => "There are some PHP syntax errors!",
            Self::StyleFixer => "There are coding standards violations!",
            Self::StylePsr => "There are PHPCS coding standards violations!",
            Self::MessDetector => "There are PHPMD violations!",
            Self::TemplateStyle => "There are twig code style violations!",
        }
    }

    /// Returns the content type the check inspects.
    #[must_use]
    pub const fn file_type(self) -> ContentType {
        match self {
            Self::TemplateStyle => ContentType::Template,
            _ => ContentType::Source,
        }
    }

    /// Returns the program the check needs on PATH.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::TemplateStyle => "vendor/bin/twigcs",
            _ => "php",
        }
    }

    /// Builds the command that checks a single file.
    #[must_use]
    pub fn command_for(self, file: &str) -> CommandLine {
        match self {
            Self::PhpLint => CommandLine::new("php", ["-l", file]),
            Self::StyleFixer => CommandLine::new(
                "php",
                ["vendor/bin/php-cs-fixer", "--dry-run", "-vvv", "fix", file],
            ),
            Self::StylePsr => CommandLine::new("php", ["vendor/bin/phpcs", file]),
            Self::MessDetector => CommandLine::new(
                "php",
                ["vendor/bin/phpmd", file, "text", "PmdRules.xml"],
            ),
            Self::TemplateStyle => CommandLine::new("vendor/bin/twigcs", [file]),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("Unknown check: {s}. Expected one of: {}", known.join(", "))
            })
    }
}
