//! Version-control boundary: resolving refs and ref-pinned file content.
//!
//! The engine only ever asks three questions (current branch, current
//! commit, the commit a ref points at) plus one content read. Lookups that
//! fail return `None` so resolution fails open to the working copy.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Read-only repository metadata used when resolving ref-pinned steps.
pub trait GitLookup {
    /// The currently checked-out branch name, if any.
    fn head_branch(&self) -> Option<String>;

    /// The commit hash the working copy is at.
    fn head_commit(&self) -> Option<String>;

    /// The commit hash a named ref resolves to.
    fn ref_commit(&self, name: &str) -> Option<String>;

    /// The contents of a repository-relative file at the given ref.
    fn file_at_ref(&self, file: &str, git_ref: &str) -> Option<String>;
}

/// Shells out to `git` in the workspace root.
#[derive(Debug, Clone)]
pub struct CliGit {
    workdir: PathBuf,
}

impl CliGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Runs a `git` command and returns trimmed stdout on success.
    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8(output.stdout).ok()?;
        Some(stdout.trim_end().to_string())
    }
}

impl GitLookup for CliGit {
    fn head_branch(&self) -> Option<String> {
        // Prints "HEAD" when detached, which never equals a tour ref.
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .filter(|branch| branch != "HEAD")
    }

    fn head_commit(&self) -> Option<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    fn ref_commit(&self, name: &str) -> Option<String> {
        self.git(&[
            "rev-parse",
            "--verify",
            "--quiet",
            &format!("{name}^{{commit}}"),
        ])
    }

    fn file_at_ref(&self, file: &str, git_ref: &str) -> Option<String> {
        self.git(&["show", &format!("{git_ref}:{file}")])
    }
}

/// A lookup for workspaces without version control: every question fails
/// open, so file steps always resolve to the working copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGit;

impl GitLookup for NoGit {
    fn head_branch(&self) -> Option<String> {
        None
    }

    fn head_commit(&self) -> Option<String> {
        None
    }

    fn ref_commit(&self, _name: &str) -> Option<String> {
        None
    }

    fn file_at_ref(&self, _file: &str, _git_ref: &str) -> Option<String> {
        None
    }
}

/// Opens a lookup for the given workspace root, degrading to [`NoGit`]
/// when the root isn't inside a git repository.
pub fn open(workspace_root: Option<&Path>) -> Box<dyn GitLookup> {
    match workspace_root {
        Some(root) => Box::new(CliGit::new(root)),
        None => Box::new(NoGit),
    }
}
