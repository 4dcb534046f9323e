//! Inter-tour chaining: which tour comes next, which came before.
//!
//! An explicit `nextTour` title link wins. Without one, chaining falls
//! back to numeric `"#N -"` title prefixes: `#1 - Intro` is followed by
//! whichever sibling's title starts with `#2` (or `2`) and a `-` or `:`.

use regex::Regex;

use crate::model::SharedTour;

/// The tour following `current`, if any.
pub fn next_tour(tours: &[SharedTour], current: &SharedTour) -> Option<SharedTour> {
    if let Some(next_title) = current.borrow().next_tour.clone() {
        return find_by_title(tours, &next_title);
    }

    let number = current.borrow().number()?;
    find_by_number(tours, number + 1)
}

/// The tour preceding `current`, if any.
///
/// Prefers the reverse link (a sibling whose `nextTour` names the current
/// title) before falling back to numeric prefixes.
pub fn previous_tour(tours: &[SharedTour], current: &SharedTour) -> Option<SharedTour> {
    let current_title = current.borrow().title.clone();
    let linked = tours
        .iter()
        .find(|tour| tour.borrow().next_tour.as_deref() == Some(current_title.as_str()));
    if let Some(tour) = linked {
        return Some(tour.clone());
    }

    let number = current.borrow().number()?;
    find_by_number(tours, number.checked_sub(1)?)
}

fn find_by_title(tours: &[SharedTour], title: &str) -> Option<SharedTour> {
    tours
        .iter()
        .find(|tour| tour.borrow().title == title)
        .cloned()
}

fn find_by_number(tours: &[SharedTour], number: u32) -> Option<SharedTour> {
    let pattern = Regex::new(&format!(r"^#?{number}\s+[-:]")).ok()?;
    tours
        .iter()
        .find(|tour| pattern.is_match(&tour.borrow().title))
        .cloned()
}
