//! Projection helpers: the text display surfaces render.
//!
//! The engine computes what a status line or tree row should say; the host
//! decides where it goes. Everything here is a pure derivation from the
//! current state.

use std::sync::OnceLock;

use regex::Regex;

use crate::engine::navigator::Navigator;
use crate::model::Tour;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#+\s*(.*)").expect("valid pattern"))
}

/// The status-line text while a tour is active, e.g.
/// `Recording Tour: #2 of 5 (Getting started)`. `None` when idle.
pub fn status_line(navigator: &Navigator) -> Option<String> {
    let active = navigator.active()?;
    let tour = active.tour.borrow();
    let prefix = if navigator.is_recording() {
        "Recording "
    } else {
        ""
    };

    Some(format!(
        "{prefix}Tour: #{} of {} ({})",
        active.step + 1,
        tour.steps.len(),
        tour.display_title()
    ))
}

/// A step's display label.
///
/// Falls through: explicit title, then a leading Markdown heading in the
/// description, then the scraped marker title, then (optionally) the file,
/// directory, or uri the step anchors to. A `summary` verdict, when
/// present, is prepended uppercased.
pub fn step_label(
    tour: &Tour,
    step_number: usize,
    include_step_number: bool,
    default_to_file_name: bool,
) -> String {
    let Some(step) = tour.steps.get(step_number) else {
        return String::new();
    };

    let prefix = if include_step_number {
        format!("#{} - ", step_number + 1)
    } else {
        String::new()
    };

    let mut label = String::new();
    if let Some(title) = &step.title {
        label = title.clone();
    } else if let Some(captures) = heading_pattern().captures(step.description.trim()) {
        label = captures[1].to_string();
    } else if let Some(marker_title) = &step.marker_title {
        label = marker_title.clone();
    } else if default_to_file_name {
        label = step
            .uri
            .clone()
            .or_else(|| step.directory.clone())
            .or_else(|| step.file.clone())
            .unwrap_or_default();
    }

    match &step.summary {
        Some(summary) => format!("{prefix}{}: {label}", summary.to_uppercase()),
        None => format!("{prefix}{label}"),
    }
}

/// A tour's one-line listing description, e.g. `5 steps (Primary)`.
pub fn tour_description(tour: &Tour) -> String {
    let mut description = format!("{} steps", tour.steps.len());
    if tour.is_primary() {
        description.push_str(" (Primary)");
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::engine::events::EventBus;
    use crate::engine::navigator::StartOptions;
    use crate::model::{Step, shared};

    fn sample_tour() -> Tour {
        let mut tour = Tour::new("#1 - Getting started");
        tour.id = "/t".into();
        tour.steps.push(Step {
            title: Some("Entry point".into()),
            ..Step::file("src/main.rs", "Where it all begins")
        });
        tour.steps.push(Step::file("src/lib.rs", "## The library\nDetails."));
        tour.steps.push(Step::file("src/cli.rs", "No heading at all"));
        tour
    }

    #[test]
    fn status_line_reflects_cursor_and_mode() {
        let mut navigator = Navigator::new(EventBus::new());
        assert_eq!(status_line(&navigator), None);

        navigator.start(shared(sample_tour()), StartOptions::default());
        assert_eq!(
            status_line(&navigator).as_deref(),
            Some("Tour: #1 of 3 (Getting started)")
        );

        navigator.advance();
        navigator.set_recording(true);
        assert_eq!(
            status_line(&navigator).as_deref(),
            Some("Recording Tour: #2 of 3 (Getting started)")
        );
    }

    #[test]
    fn label_prefers_the_explicit_title() {
        let tour = sample_tour();
        assert_eq!(step_label(&tour, 0, true, true), "#1 - Entry point");
    }

    #[test]
    fn label_falls_back_to_description_heading() {
        let tour = sample_tour();
        assert_eq!(step_label(&tour, 1, false, true), "The library");
    }

    #[test]
    fn label_falls_back_to_marker_title_then_file_name() {
        let mut tour = sample_tour();
        tour.steps[2].marker_title = Some("Scraped".into());
        assert_eq!(step_label(&tour, 2, false, true), "Scraped");

        tour.steps[2].marker_title = None;
        assert_eq!(step_label(&tour, 2, false, true), "src/cli.rs");
        assert_eq!(step_label(&tour, 2, false, false), "");
    }

    #[test]
    fn summary_verdict_is_uppercased() {
        let mut tour = sample_tour();
        tour.steps[0].summary = Some("warn".into());
        assert_eq!(step_label(&tour, 0, true, true), "#1 - WARN: Entry point");
    }

    #[test]
    fn tour_description_notes_primary() {
        let mut tour = sample_tour();
        assert_eq!(tour_description(&tour), "3 steps");
        tour.is_primary = Some(true);
        assert_eq!(tour_description(&tour), "3 steps (Primary)");
    }
}
