//! The engine facade: one object wiring discovery, navigation, progress,
//! and marker scraping together.
//!
//! Hosts construct an [`Engine`] per workspace, subscribe to its event bus,
//! and drive everything through it. The engine never renders anything; it
//! publishes state and events and leaves presentation to the host.

pub mod events;
pub mod linking;
pub mod navigator;

use std::path::PathBuf;

use crate::config::Config;
use crate::content::VirtualDocument;
use crate::engine::events::{EngineEvent, EventBus};
use crate::engine::navigator::{Navigator, StartOptions};
use crate::markers;
use crate::model::SharedTour;
use crate::progress::{ProgressTracker, Result as ProgressResult};
use crate::repository::TourRepository;

pub struct Engine {
    pub(crate) repository: TourRepository,
    pub(crate) navigator: Navigator,
    pub(crate) progress: ProgressTracker,
    pub(crate) content: VirtualDocument,
    pub(crate) config: Config,
    events: EventBus,
}

impl Engine {
    /// Builds an engine over the given workspace roots, opening the
    /// progress database where the config points.
    pub fn new(roots: Vec<PathBuf>, config: Config) -> ProgressResult<Self> {
        let progress = match config.progress_path() {
            Some(path) => ProgressTracker::open(&path)?,
            None => ProgressTracker::in_memory()?,
        };
        Ok(Self::with_progress(roots, config, progress))
    }

    pub fn with_progress(roots: Vec<PathBuf>, config: Config, progress: ProgressTracker) -> Self {
        let events = EventBus::new();
        Self {
            repository: TourRepository::new(roots),
            navigator: Navigator::new(events.clone()),
            progress,
            content: VirtualDocument::new(),
            config,
            events,
        }
    }

    /// The bus engine events are published on. Cheap to clone.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn repository(&self) -> &TourRepository {
        &self.repository
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn content(&mut self) -> &mut VirtualDocument {
        &mut self.content
    }

    /// Re-reads every discovery source and publishes the fresh collection.
    ///
    /// The active tour is reconciled before the swap, so a cursor survives
    /// edits to its backing file and ends when the file is gone. Exactly
    /// one change notification fires per refresh, however much changed.
    pub fn refresh(&mut self) {
        let fresh = self.repository.discover();
        self.navigator.reconcile(&fresh);
        self.repository.commit(fresh);

        if self.config.show_markers {
            for tour in self.repository.tours() {
                let root = self.repository.workspace_root_for(&tour.borrow());
                markers::update_marker_titles(std::slice::from_ref(tour), root.as_deref());
            }
        }

        self.events.emit(&EngineEvent::ToursChanged);
    }

    /// Starts a tour, defaulting the workspace root to the root the tour
    /// was discovered under.
    pub fn start_tour(&mut self, tour: SharedTour, mut options: StartOptions) {
        if options.workspace_root.is_none() {
            options.workspace_root = self.repository.workspace_root_for(&tour.borrow());
        }
        self.navigator.start(tour, options);
    }

    /// Switches to `tour`, ending the current tour silently when a
    /// different one is active. Same root defaulting as [`Self::start_tour`].
    pub fn jump_to_tour(&mut self, tour: SharedTour, mut options: StartOptions) {
        if options.workspace_root.is_none() {
            options.workspace_root = self.repository.workspace_root_for(&tour.borrow());
        }
        self.navigator.jump_to(tour, options);
    }

    /// Moves forward one step. Leaving a step forward marks it visited.
    ///
    /// Precondition: a tour is active and not on its last step.
    pub fn advance(&mut self) {
        self.record_visit();
        self.navigator.advance();
    }

    /// Moves back one step. Precondition: a tour is active, not on step 0.
    pub fn retreat(&mut self) {
        self.navigator.retreat();
    }

    /// Ends the active tour, marking the step it ended on as visited, and
    /// returns the tour. Precondition: a tour is active.
    pub fn end_tour(&mut self) -> SharedTour {
        self.record_visit();
        self.navigator.end(true)
    }

    /// The tour after the active one, via its explicit link or numeric
    /// title chaining. Siblings the tour was started with take precedence
    /// over the workspace collection.
    pub fn next_tour(&self) -> Option<SharedTour> {
        let active = self.navigator.active()?;
        match &active.siblings {
            Some(siblings) => linking::next_tour(siblings, &active.tour),
            None => linking::next_tour(self.repository.tours(), &active.tour),
        }
    }

    /// The tour before the active one. Counterpart of [`Self::next_tour`].
    pub fn previous_tour(&self) -> Option<SharedTour> {
        let active = self.navigator.active()?;
        match &active.siblings {
            Some(siblings) => linking::previous_tour(siblings, &active.tour),
            None => linking::previous_tour(self.repository.tours(), &active.tour),
        }
    }

    /// Whether every step of the tour has been visited.
    pub fn is_tour_complete(&self, tour: &SharedTour) -> bool {
        let tour = tour.borrow();
        self.progress.is_complete(&tour.id, tour.steps.len())
    }

    fn record_visit(&self) {
        let Some(active) = self.navigator.active() else {
            return;
        };
        if active.step < 0 {
            return;
        }

        let id = active.tour.borrow().id.clone();
        if let Err(e) = self.progress.mark_visited(&id, i64::from(active.step)) {
            tracing::warn!(error = %e, "failed to record step progress");
        }
    }
}
