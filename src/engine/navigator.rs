//! The navigation state machine: one active-tour cursor, process-wide.
//!
//! Three states: idle (no active tour), playing, and recording. The
//! navigator owns the cursor and the transitions; it never reads the file
//! system. Navigating without an active tour is a precondition violation
//! and panics — callers disable those operations at the boundary.

use std::path::PathBuf;

use crate::engine::events::{EngineEvent, EventBus};
use crate::model::{SharedTour, Step};

/// The single in-memory record of which tour and step are being navigated.
#[derive(Debug, Clone)]
pub struct ActiveTour {
    pub tour: SharedTour,

    /// Ranges over `[-1, steps.len() - 1]`; `-1` means the tour is selected
    /// but no step has been entered yet (a brand-new recording).
    pub step: i32,

    /// Root used to resolve the tour's relative file paths.
    pub workspace_root: Option<PathBuf>,

    /// The collection the tour was chosen from, kept so inter-tour links
    /// resolve even when the tour didn't come from the local workspace.
    pub siblings: Option<Vec<SharedTour>>,
}

/// Options for [`Navigator::start`].
#[derive(Debug, Clone)]
pub struct StartOptions {
    /// Defaults to 0, or -1 when the tour has no steps yet.
    pub step: Option<i32>,
    pub workspace_root: Option<PathBuf>,
    /// Start straight into recording mode, without a started event.
    pub start_recording: bool,
    /// Whether editing commands should be enabled for this tour.
    pub editable: bool,
    pub siblings: Option<Vec<SharedTour>>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            step: None,
            workspace_root: None,
            start_recording: false,
            editable: true,
            siblings: None,
        }
    }
}

/// Owns the active-tour cursor and its transitions.
pub struct Navigator {
    active: Option<ActiveTour>,
    recording: bool,
    can_edit: bool,
    events: EventBus,
}

impl Navigator {
    pub fn new(events: EventBus) -> Self {
        Self {
            active: None,
            recording: false,
            can_edit: false,
            events,
        }
    }

    pub fn active(&self) -> Option<&ActiveTour> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveTour> {
        self.active.as_mut()
    }

    /// Context flag consumed by command-enablement logic.
    pub fn in_tour(&self) -> bool {
        self.active.is_some()
    }

    /// Context flag consumed by command-enablement logic.
    pub fn can_edit_tour(&self) -> bool {
        self.can_edit
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Switches between recording and preview for the active tour.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Starts a tour, replacing any cursor already present.
    ///
    /// With `start_recording`, the transition is silent: no started event
    /// fires, since there is no step content to preview yet — surfaces
    /// react to the recording flag itself.
    pub fn start(&mut self, tour: SharedTour, options: StartOptions) {
        let step = options.step.unwrap_or_else(|| {
            if tour.borrow().steps.is_empty() {
                -1
            } else {
                0
            }
        });

        self.active = Some(ActiveTour {
            tour: tour.clone(),
            step,
            workspace_root: options.workspace_root,
            siblings: options.siblings,
        });
        self.can_edit = options.editable;

        if options.start_recording {
            self.recording = true;
        } else {
            self.events.emit(&EngineEvent::TourStarted { tour, step });
        }
    }

    /// Ends the active tour and returns it.
    ///
    /// With `fire_event`, listeners are notified synchronously while the
    /// cursor is still in place (export-on-finish flows read it).
    ///
    /// Precondition: a tour is active.
    pub fn end(&mut self, fire_event: bool) -> SharedTour {
        let tour = self
            .active
            .as_ref()
            .expect("end() without an active tour")
            .tour
            .clone();

        if fire_event {
            self.events
                .emit(&EngineEvent::TourEnded { tour: tour.clone() });
        }

        self.recording = false;
        self.can_edit = false;
        self.active = None;
        tour
    }

    /// Starts `tour`, first ending the current tour (silently) when a
    /// different one is active.
    pub fn jump_to(&mut self, tour: SharedTour, options: StartOptions) {
        let switching = self
            .active
            .as_ref()
            .is_some_and(|active| active.tour.borrow().id != tour.borrow().id);

        if switching {
            self.end(false);
        }
        self.start(tour, options);
    }

    /// Moves the cursor forward one step.
    ///
    /// No bounds checking: going past the last step is a programming error
    /// on the caller's side. Precondition: a tour is active.
    pub fn advance(&mut self) {
        let active = self.active.as_mut().expect("advance() without an active tour");
        active.step += 1;

        let (tour, step) = (active.tour.clone(), active.step);
        self.events.emit(&EngineEvent::TourStarted { tour, step });
    }

    /// Moves the cursor back one step. Same contract as [`Self::advance`].
    pub fn retreat(&mut self) {
        let active = self.active.as_mut().expect("retreat() without an active tour");
        active.step -= 1;

        let (tour, step) = (active.tour.clone(), active.step);
        self.events.emit(&EngineEvent::TourStarted { tour, step });
    }

    /// A clone of the step under the cursor, if the cursor is on one.
    pub fn current_step(&self) -> Option<Step> {
        let active = self.active.as_ref()?;
        let index = usize::try_from(active.step).ok()?;
        active.tour.borrow().steps.get(index).cloned()
    }

    /// Reconciles the cursor against a freshly discovered collection.
    ///
    /// When the active tour's id is present, its fields are refreshed in
    /// place through the shared handle (identity and step index preserved).
    /// When it is gone — the backing file was deleted — the tour ends.
    pub fn reconcile(&mut self, fresh: &[SharedTour]) {
        let Some(active) = &self.active else {
            return;
        };

        let id = active.tour.borrow().id.clone();
        match fresh.iter().find(|tour| tour.borrow().id == id) {
            Some(updated) => {
                if *active.tour.borrow() != *updated.borrow() {
                    active.tour.borrow_mut().update_from(&updated.borrow());
                }
            }
            None => {
                self.end(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::model::{Tour, shared};

    fn three_step_tour(id: &str, title: &str) -> SharedTour {
        let mut tour = Tour::new(title);
        tour.id = id.into();
        for n in 1..=3 {
            tour.steps.push(Step::file(format!("f{n}.rs"), format!("step {n}")));
        }
        shared(tour)
    }

    fn navigator_with_log() -> (Navigator, Rc<RefCell<Vec<String>>>) {
        let events = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        events.subscribe(move |event| {
            sink.borrow_mut().push(match event {
                EngineEvent::ToursChanged => "tours-changed".to_string(),
                EngineEvent::TourStarted { step, .. } => format!("started:{step}"),
                EngineEvent::TourEnded { tour } => format!("ended:{}", tour.borrow().title),
            });
        });
        (Navigator::new(events), log)
    }

    #[test]
    fn start_defaults_to_first_step() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(three_step_tour("/t", "T"), StartOptions::default());

        assert_eq!(navigator.active().unwrap().step, 0);
        assert!(navigator.in_tour());
        assert!(navigator.can_edit_tour());
        assert_eq!(*log.borrow(), vec!["started:0"]);
    }

    #[test]
    fn empty_tour_starts_before_the_first_step() {
        let (mut navigator, _) = navigator_with_log();
        let tour = shared(Tour::new("Empty"));
        navigator.start(tour, StartOptions::default());

        assert_eq!(navigator.active().unwrap().step, -1);
        assert!(navigator.current_step().is_none());
    }

    #[test]
    fn recording_start_is_silent() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(
            three_step_tour("/t", "T"),
            StartOptions {
                start_recording: true,
                ..StartOptions::default()
            },
        );

        assert!(navigator.is_recording());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn advance_and_retreat_move_the_cursor_and_notify() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(three_step_tour("/t", "T"), StartOptions::default());

        navigator.advance();
        navigator.advance();
        navigator.retreat();

        assert_eq!(navigator.active().unwrap().step, 1);
        assert_eq!(
            *log.borrow(),
            vec!["started:0", "started:1", "started:2", "started:1"]
        );
    }

    #[test]
    #[should_panic(expected = "advance() without an active tour")]
    fn advance_without_active_tour_panics() {
        let (mut navigator, _) = navigator_with_log();
        navigator.advance();
    }

    #[test]
    fn end_notifies_before_clearing() {
        let events = EventBus::new();
        let saw_active = Rc::new(Cell::new(false));

        let mut navigator = Navigator::new(events.clone());
        navigator.start(three_step_tour("/t", "T"), StartOptions::default());

        // The listener fires while the tour is still current.
        let tour_title = Rc::new(RefCell::new(String::new()));
        let sink = tour_title.clone();
        let flag = saw_active.clone();
        events.subscribe(move |event| {
            if let EngineEvent::TourEnded { tour } = event {
                flag.set(true);
                sink.borrow_mut().clone_from(&tour.borrow().title);
            }
        });

        navigator.end(true);
        assert!(saw_active.get());
        assert_eq!(*tour_title.borrow(), "T");
        assert!(!navigator.in_tour());
        assert!(!navigator.is_recording());
        assert!(!navigator.can_edit_tour());
    }

    #[test]
    fn end_without_event_is_silent() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(three_step_tour("/t", "T"), StartOptions::default());
        log.borrow_mut().clear();

        navigator.end(false);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn jump_to_a_different_tour_ends_the_current_one_silently() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(three_step_tour("/a", "A"), StartOptions::default());
        navigator.advance();
        log.borrow_mut().clear();

        navigator.jump_to(three_step_tour("/b", "B"), StartOptions::default());

        assert_eq!(navigator.active().unwrap().tour.borrow().title, "B");
        assert_eq!(navigator.active().unwrap().step, 0);
        // No "ended" entry: the switch is silent.
        assert_eq!(*log.borrow(), vec!["started:0"]);
    }

    #[test]
    fn reconcile_updates_in_place_and_keeps_the_cursor() {
        let (mut navigator, _) = navigator_with_log();
        let original = three_step_tour("/t", "Old");
        navigator.start(original.clone(), StartOptions::default());
        navigator.advance();
        navigator.advance();

        let fresh = three_step_tour("/t", "New");
        navigator.reconcile(&[fresh]);

        let active = navigator.active().unwrap();
        assert!(Rc::ptr_eq(&active.tour, &original));
        assert_eq!(active.step, 2);
        assert_eq!(active.tour.borrow().title, "New");
    }

    #[test]
    fn reconcile_ends_the_tour_when_its_id_is_gone() {
        let (mut navigator, log) = navigator_with_log();
        navigator.start(three_step_tour("/t", "T"), StartOptions::default());
        log.borrow_mut().clear();

        navigator.reconcile(&[three_step_tour("/other", "Other")]);

        assert!(!navigator.in_tour());
        assert_eq!(*log.borrow(), vec!["ended:T"]);
    }
}
