//! The virtual-content slot: a one-document backend for `contents` steps.
//!
//! The slot always reflects the single currently active step's virtual
//! contents — switching steps overwrites it. It supports exactly four
//! operations: read, write-back, stat, and rename (which renames the
//! step's associated file, not a real file). Everything else a filesystem
//! would offer is explicitly not permitted.

use crate::engine::navigator::ActiveTour;

/// Errors from the virtual-content boundary.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("tour content doesn't support {0}")]
    NotPermitted(&'static str),

    #[error("the active step has no virtual contents")]
    NoContent,

    #[error("the cursor is not on a step")]
    NoCurrentStep,
}

pub type Result<T> = core::result::Result<T, ContentError>;

/// Stat result for the virtual document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Arbitrary, monotonically increasing modification counter.
    pub mtime: u64,
    pub size: u64,
}

/// The single virtual document backing the active step's `contents`.
#[derive(Debug, Default)]
pub struct VirtualDocument {
    revision: u64,
}

impl VirtualDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active step's virtual contents.
    pub fn read(active: &ActiveTour) -> Result<String> {
        let index = usize::try_from(active.step).map_err(|_| ContentError::NoCurrentStep)?;
        let tour = active.tour.borrow();
        let step = tour.steps.get(index).ok_or(ContentError::NoCurrentStep)?;
        step.contents.clone().ok_or(ContentError::NoContent)
    }

    /// Writes edited content back into the active step.
    ///
    /// The caller persists the tour afterwards; mutation and persistence
    /// happen within one turn, before any notification is dispatched.
    pub fn write(&mut self, active: &ActiveTour, contents: String) -> Result<()> {
        let index = usize::try_from(active.step).map_err(|_| ContentError::NoCurrentStep)?;
        let mut tour = active.tour.borrow_mut();
        let step = tour
            .steps
            .get_mut(index)
            .ok_or(ContentError::NoCurrentStep)?;
        step.contents = Some(contents);
        self.revision += 1;
        Ok(())
    }

    /// Stats the virtual document. The mtime only ever moves forward, which
    /// is all the editor needs to notice a change.
    pub fn stat(&mut self) -> FileStat {
        self.revision += 1;
        FileStat {
            mtime: self.revision,
            size: 100,
        }
    }

    /// Renames the virtual document: the new name becomes the step's
    /// associated file name. No file moves anywhere.
    pub fn rename(&mut self, active: &ActiveTour, new_name: &str) -> Result<()> {
        let index = usize::try_from(active.step).map_err(|_| ContentError::NoCurrentStep)?;
        let mut tour = active.tour.borrow_mut();
        let step = tour
            .steps
            .get_mut(index)
            .ok_or(ContentError::NoCurrentStep)?;

        let base_name = new_name.rsplit('/').next().unwrap_or(new_name);
        step.file = Some(base_name.to_string());
        self.revision += 1;
        Ok(())
    }

    pub fn copy(&self) -> Result<()> {
        Err(ContentError::NotPermitted("copying files"))
    }

    pub fn delete(&self) -> Result<()> {
        Err(ContentError::NotPermitted("deleting files"))
    }

    pub fn create_directory(&self) -> Result<()> {
        Err(ContentError::NotPermitted("directories"))
    }

    pub fn read_directory(&self) -> Result<Vec<String>> {
        Err(ContentError::NotPermitted("directories"))
    }

    pub fn watch(&self) -> Result<()> {
        Err(ContentError::NotPermitted("watching files"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Step, Tour, shared};

    fn active_with_content_step() -> ActiveTour {
        let mut tour = Tour::new("T");
        tour.id = "/t".into();
        tour.steps.push(Step {
            contents: Some("original".into()),
            ..Step::content("Intro")
        });
        ActiveTour {
            tour: shared(tour),
            step: 0,
            workspace_root: None,
            siblings: None,
        }
    }

    #[test]
    fn read_returns_the_current_steps_contents() {
        let active = active_with_content_step();
        assert_eq!(VirtualDocument::read(&active).unwrap(), "original");
    }

    #[test]
    fn write_back_updates_the_step() {
        let mut document = VirtualDocument::new();
        let active = active_with_content_step();

        document.write(&active, "edited".into()).unwrap();
        assert_eq!(VirtualDocument::read(&active).unwrap(), "edited");
    }

    #[test]
    fn stat_mtime_is_monotonic() {
        let mut document = VirtualDocument::new();
        let first = document.stat();
        let second = document.stat();
        assert!(second.mtime > first.mtime);
    }

    #[test]
    fn rename_keeps_only_the_base_name() {
        let mut document = VirtualDocument::new();
        let active = active_with_content_step();

        document.rename(&active, "some/dir/notes.md").unwrap();
        assert_eq!(
            active.tour.borrow().steps[0].file.as_deref(),
            Some("notes.md")
        );
    }

    #[test]
    fn unsupported_operations_are_not_permitted() {
        let document = VirtualDocument::new();
        assert!(matches!(
            document.copy(),
            Err(ContentError::NotPermitted(_))
        ));
        assert!(matches!(
            document.delete(),
            Err(ContentError::NotPermitted(_))
        ));
        assert!(matches!(
            document.read_directory(),
            Err(ContentError::NotPermitted(_))
        ));
        assert!(matches!(
            document.watch(),
            Err(ContentError::NotPermitted(_))
        ));
    }

    #[test]
    fn cursor_before_first_step_has_no_content() {
        let mut active = active_with_content_step();
        active.step = -1;
        assert!(matches!(
            VirtualDocument::read(&active),
            Err(ContentError::NoCurrentStep)
        ));
    }
}
