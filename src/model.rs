//! Core data model: tours and their steps.
//!
//! A tour is an ordered sequence of annotated code locations. Tours are
//! persisted as JSON with camelCase field names; the `id` field is derived
//! from the source file's location and never written back.

mod step;
mod tour;

pub use step::{
    AmbiguousStep, EditorPosition, EditorSelection, Step, StepKind, StepPosition, StepSelection,
};
pub use tour::{SharedTour, Tour, shared};
