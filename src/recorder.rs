//! Authoring operations: everything that mutates a tour.
//!
//! Recording runs through the shared active-tour handle, so every surface
//! observing the tour sees edits immediately; each mutation is persisted
//! to the tour's backing file before it returns.

use std::path::Path;
use std::rc::Rc;

use crate::engine::Engine;
use crate::engine::navigator::StartOptions;
use crate::model::{SharedTour, Step, StepSelection};
use crate::repository::Result;

/// Direction for [`Engine::move_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl Engine {
    /// Creates a new tour file and starts recording into it.
    ///
    /// The cursor lands at `-1`: the tour is selected but no step exists
    /// yet, and the first added step becomes step 0.
    pub fn record_tour(
        &mut self,
        workspace_root: &Path,
        title: &str,
        git_ref: Option<&str>,
    ) -> Result<SharedTour> {
        let created = self.repository.create(workspace_root, title, git_ref)?;
        self.refresh();

        // Record into the collection's handle so observers share it.
        let id = created.borrow().id.clone();
        let tour = self.repository.find(&id).unwrap_or(created);

        self.navigator.start(
            tour.clone(),
            StartOptions {
                workspace_root: Some(workspace_root.to_path_buf()),
                start_recording: true,
                ..StartOptions::default()
            },
        );
        Ok(tour)
    }

    /// Adds a file-anchored step after the cursor and moves onto it.
    ///
    /// Re-adding the location the cursor is already on is a no-op: rapid
    /// repeated captures of the same selection produce one step.
    pub fn add_file_step(
        &mut self,
        file: impl Into<String>,
        line: Option<u32>,
        selection: Option<StepSelection>,
    ) -> Result<usize> {
        let file = file.into();

        let duplicate = self.navigator.current_step().is_some_and(|current| {
            current.file.as_deref() == Some(file.as_str())
                && current.line == line
                && current.selection == selection
        });
        if duplicate {
            let active = self.navigator.active().expect("recording without an active tour");
            return Ok(usize::try_from(active.step).unwrap_or(0));
        }

        self.insert_step(Step {
            line,
            selection,
            ..Step::file(file, "")
        })
    }

    /// Adds a virtual-content step after the cursor and moves onto it.
    pub fn add_content_step(&mut self, title: impl Into<String>) -> Result<usize> {
        self.insert_step(Step::content(title))
    }

    /// Adds a directory step after the cursor and moves onto it.
    pub fn add_directory_step(&mut self, directory: impl Into<String>) -> Result<usize> {
        self.insert_step(Step::directory(directory))
    }

    fn insert_step(&mut self, step: Step) -> Result<usize> {
        let active = self
            .navigator
            .active_mut()
            .expect("recording without an active tour");

        let insert_at = usize::try_from(active.step + 1).unwrap_or(0);
        active.tour.borrow_mut().steps.insert(insert_at, step);
        active.step = i32::try_from(insert_at).unwrap_or(i32::MAX);

        let tour = active.tour.clone();
        self.repository.save(&tour.borrow())?;
        Ok(insert_at)
    }

    /// Replaces a step's description and persists the tour.
    pub fn save_step_description(
        &mut self,
        tour: &SharedTour,
        step: usize,
        description: impl Into<String>,
    ) -> Result<()> {
        tour.borrow_mut().steps[step].description = description.into();
        self.repository.save(&tour.borrow())
    }

    /// Swaps a step with its neighbor. The cursor follows a moved step.
    pub fn move_step(
        &mut self,
        tour: &SharedTour,
        step: usize,
        direction: MoveDirection,
    ) -> Result<()> {
        let last = tour.borrow().steps.len().checked_sub(1);
        let neighbor = match direction {
            MoveDirection::Up => step.checked_sub(1),
            MoveDirection::Down => (Some(step) < last).then_some(step + 1),
        };
        let Some(neighbor) = neighbor else {
            return Ok(());
        };

        tour.borrow_mut().steps.swap(step, neighbor);

        if let Some(active) = self.navigator.active_mut() {
            if Rc::ptr_eq(&active.tour, tour) && active.step == i32::try_from(step).unwrap_or(-1) {
                active.step = i32::try_from(neighbor).unwrap_or(-1);
            }
        }

        self.repository.save(&tour.borrow())
    }

    /// Deletes the given steps (any order, duplicates ignored) and keeps
    /// the cursor on the step it was on, or its closest survivor.
    pub fn delete_steps(&mut self, tour: &SharedTour, steps: &[usize]) -> Result<()> {
        let mut steps = steps.to_vec();
        steps.sort_unstable();
        steps.dedup();

        // Remove from the end so earlier indices stay valid.
        {
            let mut tour = tour.borrow_mut();
            for &step in steps.iter().rev() {
                if step < tour.steps.len() {
                    tour.steps.remove(step);
                }
            }
        }

        if let Some(active) = self.navigator.active_mut() {
            if Rc::ptr_eq(&active.tour, tour) {
                let deleted_at_or_before = steps
                    .iter()
                    .filter(|&&step| i32::try_from(step).is_ok_and(|step| step <= active.step))
                    .count();
                active.step -= i32::try_from(deleted_at_or_before).unwrap_or(0);

                let remaining = tour.borrow().steps.len();
                if remaining == 0 {
                    active.step = -1;
                } else if active.step >= 0 {
                    // A cursor at -1 stays there: the tour was selected
                    // but no step entered yet.
                    let last = i32::try_from(remaining - 1).unwrap_or(0);
                    active.step = active.step.clamp(0, last);
                }
            }
        }

        self.repository.save(&tour.borrow())
    }

    /// Renames a tour, rewriting sibling `nextTour` links that point at the
    /// old title so chains don't dangle.
    pub fn change_tour_title(&mut self, tour: &SharedTour, title: impl Into<String>) -> Result<()> {
        let old_title = tour.borrow().title.clone();
        let title = title.into();

        for sibling in self.repository.tours() {
            if Rc::ptr_eq(sibling, tour) {
                continue;
            }
            let links_here = sibling.borrow().next_tour.as_deref() == Some(old_title.as_str());
            if links_here {
                sibling.borrow_mut().next_tour = Some(title.clone());
                self.repository.save(&sibling.borrow())?;
            }
        }

        tour.borrow_mut().title = title;
        self.repository.save(&tour.borrow())
    }

    pub fn change_tour_description(
        &mut self,
        tour: &SharedTour,
        description: impl Into<String>,
    ) -> Result<()> {
        let description = description.into();
        tour.borrow_mut().description =
            (!description.is_empty()).then_some(description);
        self.repository.save(&tour.borrow())
    }

    pub fn change_step_title(
        &mut self,
        tour: &SharedTour,
        step: usize,
        title: impl Into<String>,
    ) -> Result<()> {
        let title = title.into();
        tour.borrow_mut().steps[step].title = (!title.is_empty()).then_some(title);
        self.repository.save(&tour.borrow())
    }

    /// Re-anchors a file step to a different line.
    pub fn change_step_line(&mut self, tour: &SharedTour, step: usize, line: u32) -> Result<()> {
        tour.borrow_mut().steps[step].line = Some(line);
        self.repository.save(&tour.borrow())
    }

    /// Flags a tour as the workspace's primary tour, clearing the flag on
    /// whichever tour held it. At most one tour is primary.
    pub fn make_primary(&mut self, tour: &SharedTour) -> Result<()> {
        if let Some(current) = self.repository.primary() {
            if !Rc::ptr_eq(&current, tour) {
                current.borrow_mut().is_primary = None;
                self.repository.save(&current.borrow())?;
            }
        }

        tour.borrow_mut().is_primary = Some(true);
        self.repository.save(&tour.borrow())
    }

    pub fn unmake_primary(&mut self, tour: &SharedTour) -> Result<()> {
        tour.borrow_mut().is_primary = None;
        self.repository.save(&tour.borrow())
    }

    /// Deletes a tour's file, ending it first when it is the active tour.
    pub fn delete_tour(&mut self, tour: &SharedTour) -> Result<()> {
        let is_active = self
            .navigator
            .active()
            .is_some_and(|active| Rc::ptr_eq(&active.tour, tour));
        if is_active {
            self.navigator.end(true);
        }

        let id = tour.borrow().id.clone();
        self.repository.delete(&id)?;
        self.refresh();
        Ok(())
    }
}
