//! # code-quality-tool
//!
//! A pre-commit quality gate for PHP projects.
//!
//! The staged files of the commit are filtered against an ignore list, then
//! every enabled check (`php -l`, php-cs-fixer, PHPCS, PHPMD, twigcs) runs on
//! the files it understands. The commit is rejected as soon as a check
//! reports violations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use code_quality_tool::{Config, GitRepo, Runner};
//! use code_quality_tool::core::report::ConsoleReporter;
//!
//! #[tokio::main]
//! async fn main() -> code_quality_tool::Result<()> {
//!     let config = Config::load()?;
//!     let repo = GitRepo::discover()?;
//!
//!     let runner = Runner::new(config, repo.root());
//!     let verdict = runner.run(&repo, &ConsoleReporter::new(false)).await?;
//!
//!     verdict.ensure_passed()
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/code-quality-tool/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod checks;
pub mod cli;
pub mod config;
pub mod core;
pub mod presets;

// Re-export main types for convenience
pub use checks::{CheckKind, CheckResult};
pub use config::Config;
pub use core::classifier::{ContentType, FileSet, IgnoreRule};
pub use core::error::{Error, Result};
pub use core::git::{ChangeSetProvider, GitRepo};
pub use core::runner::{RunVerdict, Runner};
