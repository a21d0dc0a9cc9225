//! Git repository operations.
//!
//! This module finds the repository root and hooks directory, and provides
//! the change set of the commit under inspection.

use crate::core::classifier::FileSet;
use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Hash of git's empty tree, the diff base before the first commit.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Source of the file paths a run inspects.
pub trait ChangeSetProvider {
    /// Returns the paths added or modified by the change under inspection.
    fn changed_files(&self) -> Result<FileSet>;
}

/// A fixed file set, e.g. paths given on the command line.
impl ChangeSetProvider for FileSet {
    fn changed_files(&self) -> Result<FileSet> {
        Ok(self.clone())
    }
}

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
    /// Path to the .git directory (or file for worktrees).
    git_dir: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel", "--git-dir"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();

        let root = lines.next().map(PathBuf::from).ok_or(Error::NotGitRepo)?;

        let git_dir = lines
            .next()
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    root.join(p)
                }
            })
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, git_dir })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .git directory path.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the hooks directory path.
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        // Check for custom hooks path first
        if let Ok(output) = Command::new("git")
            .args(["config", "--get", "core.hooksPath"])
            .current_dir(&self.root)
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let hooks_path = PathBuf::from(&path);
                    if hooks_path.is_absolute() {
                        return hooks_path;
                    }
                    return self.root.join(hooks_path);
                }
            }
        }

        self.git_dir.join("hooks")
    }

    /// Returns the path to a specific hook.
    #[must_use]
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir().join(hook_name)
    }

    /// Returns true if HEAD points at a commit.
    pub fn has_head(&self) -> Result<bool> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        Ok(output.status.success())
    }

    /// Returns the staged files that are added or modified, relative to the root.
    pub fn staged_files(&self) -> Result<FileSet> {
        let base = if self.has_head()? {
            "HEAD"
        } else {
            tracing::debug!("no commit yet, diffing against the empty tree");
            EMPTY_TREE
        };

        let output = Command::new("git")
            .args([
                "diff-index",
                "--cached",
                "--name-status",
                "--no-renames",
                "-z",
                base,
            ])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("get staged files", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git("diff-index", stderr.trim().to_string()));
        }

        let files = parse_name_status(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(count = files.len(), "collected staged files");
        Ok(files)
    }
}

impl ChangeSetProvider for GitRepo {
    fn changed_files(&self) -> Result<FileSet> {
        self.staged_files()
    }
}

/// Parses `--name-status -z` output, keeping added and modified paths.
fn parse_name_status(raw: &str) -> FileSet {
    let fields: Vec<&str> = raw.split('\0').filter(|s| !s.is_empty()).collect();

    fields
        .chunks(2)
        .filter_map(|entry| match entry {
            [status, path] if status.starts_with('A') || status.starts_with('M') => {
                Some((*path).to_string())
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn git(path: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .expect("run git");
        assert!(output.status.success(), "git {args:?} failed");
    }

    fn create_test_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path();

        git(path, &["init"]);
        git(path, &["config", "user.email", "test@test.com"]);
        git(path, &["config", "user.name", "Test"]);
        git(path, &["config", "commit.gpgsign", "false"]);

        let repo = GitRepo::discover_from(path).expect("discover repo");
        (temp, repo)
    }

    fn write(temp: &TempDir, relative: &str, content: &str) {
        let path = temp.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, content).expect("write file");
    }

    // =========================================================================
    // Discovery tests
    // =========================================================================

    #[test]
    fn test_discover_repo() {
        let (_temp, repo) = create_test_repo();
        assert!(repo.root().exists());
        assert!(repo.git_dir().exists());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (temp, _) = create_test_repo();

        let subdir = temp.path().join("src/Controller");
        std::fs::create_dir_all(&subdir).expect("create subdir");

        let repo = GitRepo::discover_from(&subdir).expect("discover from subdir");
        // Canonicalize both paths to handle macOS /var -> /private/var symlinks
        let expected = temp.path().canonicalize().expect("canonicalize temp");
        let actual = repo.root().canonicalize().expect("canonicalize root");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_not_git_repo() {
        let temp = TempDir::new().expect("create temp dir");
        let result = GitRepo::discover_from(temp.path());
        assert!(matches!(result, Err(Error::NotGitRepo)));
    }

    // =========================================================================
    // Hooks tests
    // =========================================================================

    #[test]
    fn test_hook_path() {
        let (_temp, repo) = create_test_repo();
        let hook_path = repo.hook_path("pre-commit");
        assert!(hook_path.ends_with("pre-commit"));
        assert!(hook_path.to_string_lossy().contains("hooks"));
    }

    // =========================================================================
    // Change set tests
    // =========================================================================

    #[test]
    fn test_parse_name_status() {
        let raw = "A\0src/a.php\0M\0b.twig\0D\0gone.php\0T\0link.php\0";
        assert_eq!(parse_name_status(raw), FileSet::new(["src/a.php", "b.twig"]));
        assert!(parse_name_status("").is_empty());
    }

    #[test]
    fn test_parse_name_status_keeps_spaces() {
        let raw = "A\0src/my file.php\0";
        assert_eq!(parse_name_status(raw), FileSet::new(["src/my file.php"]));
    }

    #[test]
    fn test_no_head_in_fresh_repo() {
        let (_temp, repo) = create_test_repo();
        assert!(!repo.has_head().expect("rev-parse"));
    }

    #[test]
    fn test_staged_files_empty() {
        let (_temp, repo) = create_test_repo();
        let staged = repo.changed_files().expect("get staged files");
        assert!(staged.is_empty());
    }

    #[test]
    fn test_staged_files_before_first_commit() {
        let (temp, repo) = create_test_repo();
        write(&temp, "src/a.php", "<?php echo 1;");
        write(&temp, "templates/b.twig", "{{ x }}");
        write(&temp, "untracked.php", "<?php");
        git(temp.path(), &["add", "src", "templates"]);

        let staged = repo.changed_files().expect("get staged files");
        assert_eq!(staged, FileSet::new(["src/a.php", "templates/b.twig"]));
    }

    #[test]
    fn test_staged_files_after_commit() {
        let (temp, repo) = create_test_repo();
        write(&temp, "kept.php", "<?php");
        write(&temp, "changed.php", "<?php");
        write(&temp, "removed.php", "<?php");
        git(temp.path(), &["add", "."]);
        git(temp.path(), &["commit", "-m", "initial"]);
        assert!(repo.has_head().expect("rev-parse"));

        write(&temp, "changed.php", "<?php echo 2;");
        write(&temp, "added.php", "<?php");
        git(temp.path(), &["add", "changed.php", "added.php"]);
        git(temp.path(), &["rm", "--quiet", "removed.php"]);

        let staged = repo.changed_files().expect("get staged files");
        assert_eq!(staged, FileSet::new(["added.php", "changed.php"]));
    }

    #[test]
    fn test_file_set_is_its_own_provider() {
        let files = FileSet::new(["a.php"]);
        assert_eq!(files.changed_files().expect("static set"), files);
    }

    // =========================================================================
    // Path accessor tests
    // =========================================================================

    #[test]
    fn test_git_dir_accessor() {
        let (temp, repo) = create_test_repo();
        // Canonicalize both paths to handle macOS /var -> /private/var symlinks
        let expected = temp
            .path()
            .join(".git")
            .canonicalize()
            .expect("canonicalize temp");
        let actual = repo.git_dir().canonicalize().expect("canonicalize git_dir");
        assert_eq!(actual, expected);
    }
}
