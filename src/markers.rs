//! Marker steps: locating steps by generated in-code tokens.
//!
//! A marker tour tags source lines with `<prefix>.<n>` comments instead of
//! storing line numbers. The prefix is the tour's `stepMarker`, or `CT<n>`
//! derived from a numeric title. A marker comment may carry a title after
//! `-` or `:`, which is scraped into the step's derived `markerTitle`.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::model::{SharedTour, Tour};

/// The tour's marker prefix, if it is a marker tour at all.
pub fn marker_prefix(tour: &Tour) -> Option<String> {
    if let Some(marker) = &tour.step_marker {
        return Some(marker.clone());
    }
    tour.number().map(|n| format!("CT{n}"))
}

/// Whether the given step is located by marker: a file step without a
/// stored line, in a marker tour.
pub fn is_marker_step(tour: &Tour, step_number: usize) -> bool {
    if marker_prefix(tour).is_none() {
        return false;
    }
    tour.steps
        .get(step_number)
        .is_some_and(|step| step.file.is_some() && step.line.is_none())
}

/// The literal marker token for a step, e.g. `CT1.2` for the second step
/// of tour `#1`. `None` when the step isn't marker-located.
pub fn step_marker(tour: &Tour, step_number: usize) -> Option<String> {
    if !is_marker_step(tour, step_number) {
        return None;
    }
    Some(format!("{}.{}", marker_prefix(tour)?, step_number + 1))
}

/// Parses a marker on a source line, returning the 1-based step number it
/// names. Used to map a clicked gutter marker back to a step.
pub fn marker_for_line(tour: &Tour, line_text: &str) -> Option<usize> {
    let prefix = marker_prefix(tour)?;
    let pattern = Regex::new(&format!(r"{}\.(\d+)", regex::escape(&prefix))).ok()?;
    pattern
        .captures(line_text)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Re-derives `markerTitle` for every marker step of every marker tour.
///
/// Scraping reads the working copy: markers are maintained in live source
/// comments. Unreadable files simply leave the title unset.
pub fn update_marker_titles(tours: &[SharedTour], workspace_root: Option<&Path>) {
    for tour in tours {
        let mut tour = tour.borrow_mut();
        if marker_prefix(&tour).is_none() {
            continue;
        }
        update_tour_marker_titles(&mut tour, workspace_root);
    }
}

fn update_tour_marker_titles(tour: &mut Tour, workspace_root: Option<&Path>) {
    let Some(prefix) = marker_prefix(tour) else {
        return;
    };

    for step_number in 0..tour.steps.len() {
        if !is_marker_step(tour, step_number) {
            continue;
        }

        let Some(file) = tour.steps[step_number].file.clone() else {
            continue;
        };
        let path = match workspace_root {
            Some(root) => root.join(&file),
            None => file.into(),
        };
        let Ok(text) = fs::read_to_string(&path) else {
            continue;
        };

        tour.steps[step_number].marker_title = scrape_title(&prefix, step_number, &text);
    }
}

/// Finds `<prefix>.<n> - title` (or `: title`) in the file text.
fn scrape_title(prefix: &str, step_number: usize, text: &str) -> Option<String> {
    let pattern = Regex::new(&format!(
        r"{}\.{}\s*[-:]\s*(.*)",
        regex::escape(prefix),
        step_number + 1
    ))
    .ok()?;
    Some(pattern.captures(text)?.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use crate::model::{Step, shared};

    fn marker_tour(title: &str) -> Tour {
        let mut tour = Tour::new(title);
        tour.steps.push(Step::file("src/lib.rs", ""));
        tour
    }

    #[test]
    fn prefix_prefers_the_explicit_marker() {
        let mut tour = marker_tour("#1 - Intro");
        tour.step_marker = Some("WALK".into());
        assert_eq!(marker_prefix(&tour).as_deref(), Some("WALK"));
    }

    #[test]
    fn prefix_derives_from_numeric_titles() {
        assert_eq!(
            marker_prefix(&marker_tour("#3 - Internals")).as_deref(),
            Some("CT3")
        );
        assert_eq!(marker_prefix(&marker_tour("No numbers here")), None);
    }

    #[test]
    fn only_file_steps_without_lines_are_marker_steps() {
        let mut tour = marker_tour("#1 - Intro");
        tour.steps.push(Step {
            line: Some(10),
            ..Step::file("src/main.rs", "")
        });
        tour.steps.push(Step::content("Virtual"));

        assert!(is_marker_step(&tour, 0));
        assert!(!is_marker_step(&tour, 1));
        assert!(!is_marker_step(&tour, 2));

        assert_eq!(step_marker(&tour, 0).as_deref(), Some("CT1.1"));
        assert_eq!(step_marker(&tour, 1), None);
    }

    #[test]
    fn marker_for_line_parses_the_step_number() {
        let tour = marker_tour("#2 - Setup");
        assert_eq!(marker_for_line(&tour, "// CT2.4 - wiring"), Some(4));
        assert_eq!(marker_for_line(&tour, "// nothing here"), None);
    }

    #[test]
    fn scrapes_titles_from_the_working_copy() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/lib.rs"),
            "fn a() {}\n// CT1.1 - The entry point\nfn b() {}\n",
        )
        .unwrap();

        let tours = vec![shared(marker_tour("#1 - Intro"))];
        update_marker_titles(&tours, Some(dir.path()));

        assert_eq!(
            tours[0].borrow().steps[0].marker_title.as_deref(),
            Some("The entry point")
        );
    }

    #[test]
    fn unreadable_files_leave_titles_unset() {
        let tours = vec![shared(marker_tour("#1 - Intro"))];
        update_marker_titles(&tours, Some(Path::new("/nonexistent")));
        assert_eq!(tours[0].borrow().steps[0].marker_title, None);
    }
}
