//! Configuration presets for common project types.
//!
//! Presets give `cqt init` a starting set of enabled checks.

/// Available preset names.
pub mod names {
    /// Syntax check only.
    pub const MINIMAL: &str = "minimal";
    /// Plain PHP projects (lint, PHPCS, PHPMD).
    pub const PHP: &str = "php";
    /// Symfony applications (every PHP check plus twigcs).
    pub const SYMFONY: &str = "symfony";
}

/// Returns a list of available preset names.
#[must_use]
pub const fn available() -> &'static [&'static str] {
    &[names::MINIMAL, names::PHP, names::SYMFONY]
}

/// Returns a description for a preset.
#[must_use]
pub fn description(name: &str) -> &'static str {
    match name {
        names::MINIMAL => "PHP syntax check only (php -l)",
        names::PHP => "PHP projects (php -l, phpcs, phpmd), vendor/ ignored",
        names::SYMFONY => "Symfony projects (all PHP checks and twigcs), vendor/ and var/ ignored",
        _ => "Unknown preset",
    }
}
