//! File classification and ignore filtering.
//!
//! Two independent filters apply to the change set:
//! - [`IgnoreRule`] drops whole folders by path prefix, before any check runs;
//! - [`classify`] maps a path to a [`ContentType`] by suffix, so each check
//!   only sees the files it understands.

use crate::core::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Kind of content a check operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// PHP source files.
    Source,
    /// Twig templates.
    Template,
}

impl ContentType {
    /// Returns a human-readable name for the content type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Template => "template",
        }
    }

    /// Returns the file suffix that identifies this content type.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Source => ".php",
            Self::Template => ".twig",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const CONTENT_TYPES: [ContentType; 2] = [ContentType::Source, ContentType::Template];

/// Classifies a path by its suffix. Returns `None` for files no check handles.
#[must_use]
pub fn classify(path: &str) -> Option<ContentType> {
    CONTENT_TYPES
        .into_iter()
        .find(|content_type| path.ends_with(content_type.suffix()))
}

/// Ordered list of repository-relative paths for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet(Vec<String>);

impl FileSet {
    /// Creates a file set from paths, keeping their order.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// Returns the number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the paths in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns a new set without the paths matched by `rule`.
    #[must_use]
    pub fn without_ignored(&self, rule: &IgnoreRule) -> Self {
        Self(
            self.0
                .iter()
                .filter(|path| !rule.is_ignored(path))
                .cloned()
                .collect(),
        )
    }

    /// Returns the paths of the given content type, in order.
    #[must_use]
    pub fn of_type(&self, content_type: ContentType) -> Vec<&str> {
        self.iter()
            .filter(|path| classify(path) == Some(content_type))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for FileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Prefix-based exclusion compiled from the configured ignore folders.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: Regex,
}

impl IgnoreRule {
    /// Compiles the folder list into a single anchored pattern.
    ///
    /// Returns `Ok(None)` for an empty list: nothing is ignored.
    pub fn compile(folders: &[String]) -> Result<Option<Self>> {
        if folders.is_empty() {
            return Ok(None);
        }

        if let Some(position) = folders.iter().position(|folder| folder.is_empty()) {
            return Err(Error::config_invalid(
                "git_hooks.ignore_folder",
                format!("entry {position} is empty and would ignore every file"),
            ));
        }

        let alternatives: Vec<String> = folders.iter().map(|f| regex::escape(f)).collect();
        let source = format!("^(?:{})", alternatives.join("|"));

        let pattern = Regex::new(&source).map_err(|e| {
            Error::config_invalid("git_hooks.ignore_folder", format!("cannot compile: {e}"))
        })?;

        Ok(Some(Self { pattern }))
    }

    /// Returns true if the path starts with one of the ignored folders.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}
