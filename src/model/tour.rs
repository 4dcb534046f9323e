//! Tour types: the unit of navigation.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A tour shared between the repository, the navigation cursor, and any
/// renderer. Mutations made while recording are visible through the same
/// handle every observer reads.
pub type SharedTour = Rc<RefCell<Tour>>;

/// Wraps a tour in a shared handle.
pub fn shared(tour: Tour) -> SharedTour {
    Rc::new(RefCell::new(tour))
}

/// An ordered, named sequence of annotated code locations.
///
/// `id` is the canonical location of the tour's source file. It is the only
/// stable identity a tour has, is never shown to the user, and is stripped
/// before the tour is written back to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    /// Written for tooling discoverability, never read back.
    #[serde(
        rename = "$schema",
        skip_deserializing,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<String>,

    #[serde(skip)]
    pub id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub steps: Vec<super::Step>,

    /// Pins all file-based steps to a version-control revision instead of
    /// the live working copy. `"HEAD"` is a sentinel for "not pinned".
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// At most one tour in a collection is primary; it is the tour
    /// auto-started when the workspace opens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,

    /// Title of the tour that follows this one, chaining tours into a
    /// sequence. Without it, chaining falls back to `"#N -"` title prefixes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tour: Option<String>,

    /// Overrides the generated marker prefix for marker-located steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_marker: Option<String>,
}

fn title_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#?(\d+)\s+-").expect("valid pattern"))
}

impl Tour {
    /// A minimal tour with the given title and no steps.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            schema: None,
            id: String::new(),
            title: title.into(),
            description: None,
            steps: Vec::new(),
            git_ref: None,
            is_primary: None,
            next_tour: None,
            step_marker: None,
        }
    }

    /// The tour's sequence number, parsed from a `"#N -"` title prefix.
    pub fn number(&self) -> Option<u32> {
        title_number_pattern()
            .captures(&self.title)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    /// The title as rendered to the user: any `"#N -"` prefix is stripped.
    pub fn display_title(&self) -> &str {
        if self.number().is_some() {
            if let Some(rest) = self.title.splitn(2, '-').nth(1) {
                return rest.trim();
            }
        }
        &self.title
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary.unwrap_or(false)
    }

    /// Copies every field except the identity from `other`.
    ///
    /// Used by reconciliation to refresh an already-observed tour in place
    /// without replacing the shared handle renderers hold.
    pub fn update_from(&mut self, other: &Tour) {
        self.title = other.title.clone();
        self.description = other.description.clone();
        self.steps = other.steps.clone();
        self.git_ref = other.git_ref.clone();
        self.is_primary = other.is_primary;
        self.next_tour = other.next_tour.clone();
        self.step_marker = other.step_marker.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Step;

    #[test]
    fn number_parsed_from_title_prefix() {
        assert_eq!(Tour::new("#1 - Intro").number(), Some(1));
        assert_eq!(Tour::new("12 - No hash").number(), Some(12));
        assert_eq!(Tour::new("Getting started").number(), None);
        assert_eq!(Tour::new("#1- missing space").number(), None);
    }

    #[test]
    fn display_title_strips_numeric_prefix() {
        assert_eq!(Tour::new("#2 - Setup").display_title(), "Setup");
        assert_eq!(Tour::new("Plain title").display_title(), "Plain title");
        assert_eq!(
            Tour::new("#3 - Dashes - kept").display_title(),
            "Dashes - kept"
        );
    }

    #[test]
    fn id_is_never_serialized() {
        let mut tour = Tour::new("A tour");
        tour.id = "/workspace/.codewalk/tours/a.tour".into();

        let json = serde_json::to_string(&tour).unwrap();
        assert!(!json.contains(".codewalk"));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn schema_is_written_but_not_read() {
        let mut tour = Tour::new("A tour");
        tour.schema = Some("https://example.com/tour-schema".into());
        let json = serde_json::to_string(&tour).unwrap();
        assert!(json.contains("$schema"));

        let parsed: Tour = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.schema, None);
    }

    #[test]
    fn update_from_preserves_identity() {
        let mut tour = Tour::new("Old title");
        tour.id = "/a/b.tour".into();

        let mut fresh = Tour::new("New title");
        fresh.id = "/a/b.tour".into();
        fresh.steps.push(Step::content("Intro"));
        fresh.next_tour = Some("#2 - Next".into());

        tour.update_from(&fresh);
        assert_eq!(tour.id, "/a/b.tour");
        assert_eq!(tour.title, "New title");
        assert_eq!(tour.steps.len(), 1);
        assert_eq!(tour.next_tour.as_deref(), Some("#2 - Next"));
    }

    #[test]
    fn camel_case_field_names_on_disk() {
        let json = r##"{
            "title": "#1 - Intro",
            "nextTour": "#2 - Setup",
            "isPrimary": true,
            "stepMarker": "TOUR1",
            "ref": "main",
            "steps": []
        }"##;

        let tour: Tour = serde_json::from_str(json).unwrap();
        assert_eq!(tour.next_tour.as_deref(), Some("#2 - Setup"));
        assert!(tour.is_primary());
        assert_eq!(tour.step_marker.as_deref(), Some("TOUR1"));
        assert_eq!(tour.git_ref.as_deref(), Some("main"));
    }
}
