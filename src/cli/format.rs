//! Human-readable rendering of tours and steps for terminal output.

use std::fs;
use std::path::Path;

use crate::git::GitLookup;
use crate::markers;
use crate::model::Tour;
use crate::resolver::{self, Locator};
use crate::status;

/// Renders one step: header, resolved location, and description.
pub fn render_step(
    tour: &Tour,
    step: i32,
    workspace_root: Option<&Path>,
    git: &dyn GitLookup,
) -> String {
    if step < 0 {
        return format!(
            "Recording \"{}\": no steps yet. Add one with `codewalk add`.",
            tour.display_title()
        );
    }

    let index = usize::try_from(step).unwrap_or(usize::MAX);
    let Some(current) = tour.steps.get(index) else {
        return format!(
            "Step {} is out of range: the tour has {} steps.",
            step + 1,
            tour.steps.len()
        );
    };

    let mut out = format!("Step {} of {}", index + 1, tour.steps.len());
    let label = status::step_label(tour, index, false, true);
    if !label.is_empty() {
        out.push_str(": ");
        out.push_str(&label);
    }
    out.push('\n');

    if let Some(location) = render_location(tour, index, workspace_root, git) {
        out.push_str("  ");
        out.push_str(&location);
        out.push('\n');
    }

    if !current.description.is_empty() {
        out.push('\n');
        out.push_str(&current.description);
        out.push('\n');
    }

    out
}

fn render_location(
    tour: &Tour,
    index: usize,
    workspace_root: Option<&Path>,
    git: &dyn GitLookup,
) -> Option<String> {
    let step = &tour.steps[index];
    let marker = markers::step_marker(tour, index);

    let locator = match resolver::resolve(step, workspace_root, tour.git_ref.as_deref(), git) {
        Ok(locator) => locator,
        Err(e) => return Some(format!("invalid step: {e}")),
    };

    Some(match locator {
        Locator::Document { path } => {
            let text = fs::read_to_string(&path).ok();
            let line = resolver::resolve_line(step, marker.as_deref(), text.as_deref());
            format!("{}:{}", step.file.as_deref().unwrap_or_default(), line + 1)
        }
        Locator::GitObject { path: _, git_ref } => {
            let file = step.file.as_deref().unwrap_or_default();
            let text = git.file_at_ref(file, &git_ref);
            let line = resolver::resolve_line(step, marker.as_deref(), text.as_deref());
            format!("{file}:{} (at {git_ref})", line + 1)
        }
        Locator::Content { file } => match file {
            Some(file) => format!("(virtual) {file}"),
            None => "(virtual content)".to_string(),
        },
        Locator::Directory { path: _ } => {
            format!("{}/", step.directory.as_deref().unwrap_or_default())
        }
        Locator::External { uri } => uri,
        Locator::View { id } => format!("view: {id}"),
        Locator::Placeholder => return None,
    })
}

/// One line per tour for `codewalk list`.
pub fn tour_line(tour: &Tour, visited: usize, complete: bool) -> String {
    let mut line = format!(
        "{}  [{}]",
        tour.title,
        status::tour_description(tour)
    );
    if complete {
        line.push_str("  [complete]");
    } else if visited > 0 {
        line.push_str(&format!("  [{visited}/{} visited]", tour.steps.len()));
    }
    line
}

/// One indented line per step for `codewalk list --steps`, with a
/// checkmark for visited steps.
pub fn step_line(tour: &Tour, index: usize, visited: bool) -> String {
    let mark = if visited { "x" } else { " " };
    format!("  [{mark}] {}", status::step_label(tour, index, true, true))
}
