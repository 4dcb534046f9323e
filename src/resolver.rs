//! Step resolution: turning an abstract step into a concrete locator.
//!
//! Resolution is a pure function of its inputs apart from read-only
//! version-control lookups. Failures degrade: an unreadable file or a ref
//! that can't be resolved falls back to the working copy or a sentinel
//! position rather than blocking navigation.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::git::GitLookup;
use crate::model::{AmbiguousStep, Step, StepKind};

/// Where a step lands when no line, selection, or pattern is available and
/// the document text couldn't be read: effectively "end of file".
pub const END_OF_DOCUMENT_LINE: u32 = 2000;

/// A concrete location for a resolved step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A working-copy document.
    Document { path: PathBuf },

    /// A document at a pinned version-control revision.
    GitObject { path: PathBuf, git_ref: String },

    /// The single "current step" virtual-content slot; `file` optionally
    /// names the document.
    Content { file: Option<String> },

    /// A directory, revealed rather than opened.
    Directory { path: PathBuf },

    /// An external location, used verbatim.
    External { uri: String },

    /// A host panel/view to focus.
    View { id: String },

    /// The fixed "no content" sentinel.
    Placeholder,
}

/// Resolves a step against a workspace root and an optional pinned ref.
///
/// File steps are rewritten to a historical revision only when `git_ref` is
/// set, isn't the `"HEAD"` sentinel, and demonstrably differs from the
/// current checkout; any failed lookup leaves the working copy in place.
pub fn resolve(
    step: &Step,
    workspace_root: Option<&Path>,
    git_ref: Option<&str>,
    git: &dyn GitLookup,
) -> Result<Locator, AmbiguousStep> {
    Ok(match step.kind()? {
        StepKind::Content { file, .. } => Locator::Content {
            file: file.map(str::to_string),
        },
        StepKind::ExternalUri(uri) => Locator::External {
            uri: uri.to_string(),
        },
        StepKind::File(file) => {
            let path = join_workspace(workspace_root, file);
            match git_ref {
                Some(r) if r != "HEAD" && differs_from_checkout(r, git) => Locator::GitObject {
                    path,
                    git_ref: r.to_string(),
                },
                _ => Locator::Document { path },
            }
        }
        StepKind::Directory(directory) => Locator::Directory {
            path: join_workspace(workspace_root, directory),
        },
        StepKind::View(id) => Locator::View { id: id.to_string() },
        StepKind::Placeholder => Locator::Placeholder,
    })
}

fn join_workspace(workspace_root: Option<&Path>, file: &str) -> PathBuf {
    match workspace_root {
        Some(root) => root.join(file),
        None => PathBuf::from(file),
    }
}

/// Whether the tour's ref addresses something other than the checkout.
///
/// The ref matches the checkout when it equals the current branch name, the
/// head commit hash, or any ref resolving to the head commit. A failed head
/// lookup counts as a match so resolution fails open to the working copy.
fn differs_from_checkout(git_ref: &str, git: &dyn GitLookup) -> bool {
    let Some(head_commit) = git.head_commit() else {
        return false;
    };

    if git.head_branch().is_some_and(|branch| branch == git_ref) {
        return false;
    }
    if head_commit == git_ref {
        return false;
    }
    if git
        .ref_commit(git_ref)
        .is_some_and(|commit| commit == head_commit)
    {
        return false;
    }

    true
}

/// Resolves the 0-based line a step anchors to.
///
/// Priority: explicit `line`, then the selection end, then a pattern match
/// (the step's own `pattern`, else the tour's generated `marker` token),
/// then the end of the document. `text` is the target document's contents
/// when it could be read; without it the fallback is the fixed sentinel.
pub fn resolve_line(step: &Step, marker: Option<&str>, text: Option<&str>) -> u32 {
    if let Some(line) = step.line {
        return line.saturating_sub(1);
    }
    if let Some(selection) = &step.selection {
        return selection.to_zero_based().end.line;
    }

    if step.file.is_some() {
        let pattern = step
            .pattern
            .clone()
            .or_else(|| marker.map(regex::escape));

        if let (Some(pattern), Some(text)) = (&pattern, text) {
            if let Some(line) = find_pattern_line(pattern, text) {
                return line;
            }
        }
    }

    end_of_document(text)
}

fn find_pattern_line(pattern: &str, text: &str) -> Option<u32> {
    let regex = Regex::new(pattern).ok()?;
    let offset = regex.find(text)?.start();
    Some(u32::try_from(text[..offset].matches('\n').count()).unwrap_or(u32::MAX))
}

fn end_of_document(text: Option<&str>) -> u32 {
    match text {
        Some(text) => u32::try_from(text.lines().count().saturating_sub(1))
            .unwrap_or(END_OF_DOCUMENT_LINE),
        None => END_OF_DOCUMENT_LINE,
    }
}
