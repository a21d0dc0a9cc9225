//! Core functionality for code-quality-tool.
//!
//! This module contains the main components:
//! - [`runner`]: Pipeline orchestration and the run verdict
//! - [`classifier`]: Content types, file sets and ignore rules
//! - [`executor`]: External command execution
//! - [`git`]: Git repository operations and the staged change set
//! - [`report`]: Progress and diagnostics output
//! - [`error`]: Error types and result handling

pub mod classifier;
pub mod error;
pub mod executor;
pub mod git;
pub mod report;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;
