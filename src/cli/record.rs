//! Authoring subcommand handlers: recording, step edits, tour management.

use std::path::Path;

use crate::engine::Engine;
use crate::git;
use crate::model::SharedTour;

use super::{AddStep, DirectionArg, StepCommand, TourCommand, persist_session};

pub fn cmd_record(
    engine: &mut Engine,
    root: &Path,
    title: &str,
    git_ref: Option<&str>,
) -> Result<(), String> {
    let git_ref = resolve_recording_ref(root, git_ref)?;
    let tour = engine
        .record_tour(root, title, git_ref.as_deref())
        .map_err(|e| format!("failed to create tour: {e}"))?;

    println!("Recording \"{title}\" at {}", tour.borrow().id);
    println!("Add steps with `codewalk add`, finish with `codewalk end`.");
    persist_session(engine, root)
}

/// Maps the `--ref` argument to a concrete ref. `branch` and `commit` pin
/// the tour to the current checkout; anything else is used verbatim.
fn resolve_recording_ref(root: &Path, git_ref: Option<&str>) -> Result<Option<String>, String> {
    let git = git::open(Some(root));
    match git_ref {
        None => Ok(None),
        Some("branch") => match git.head_branch() {
            Some(branch) => Ok(Some(branch)),
            None => Err("not on a branch; pin with --ref commit instead".to_string()),
        },
        Some("commit") => match git.head_commit() {
            Some(commit) => Ok(Some(commit)),
            None => Err("could not resolve the current commit".to_string()),
        },
        Some(other) => Ok(Some(other.to_string())),
    }
}

pub fn cmd_add(engine: &mut Engine, root: &Path, step: &AddStep) -> Result<(), String> {
    if !engine.navigator().is_recording() {
        return Err("not recording (use `codewalk record` to create a tour)".to_string());
    }

    let index = match step {
        AddStep::File { file, line } => engine.add_file_step(file.clone(), *line, None),
        AddStep::Content { title } => engine.add_content_step(title.clone()),
        AddStep::Directory { directory } => engine.add_directory_step(directory.clone()),
    }
    .map_err(|e| format!("failed to save tour: {e}"))?;

    println!("Added step {}.", index + 1);
    persist_session(engine, root)
}

pub fn cmd_step(engine: &mut Engine, root: &Path, command: &StepCommand) -> Result<(), String> {
    ensure_editable(engine)?;

    match command {
        StepCommand::Describe { description, step } => {
            let (tour, index) = target_step(engine, *step)?;
            engine
                .save_step_description(&tour, index, description.clone())
                .map_err(save_error)?;
        }
        StepCommand::Title { title, step } => {
            let (tour, index) = target_step(engine, *step)?;
            engine
                .change_step_title(&tour, index, title.clone())
                .map_err(save_error)?;
        }
        StepCommand::Line { line, step } => {
            let (tour, index) = target_step(engine, *step)?;
            engine
                .change_step_line(&tour, index, *line)
                .map_err(save_error)?;
        }
        StepCommand::Move { direction, step } => {
            let (tour, index) = target_step(engine, *step)?;
            engine
                .move_step(&tour, index, direction.to_domain())
                .map_err(save_error)?;
        }
        StepCommand::Delete { steps } => {
            let tour = active_tour(engine)?;
            let indices = steps
                .iter()
                .map(|n| {
                    n.checked_sub(1)
                        .ok_or_else(|| "step numbers start at 1".to_string())
                })
                .collect::<Result<Vec<usize>, String>>()?;
            engine.delete_steps(&tour, &indices).map_err(save_error)?;
            println!("Deleted {} step(s).", indices.len());
        }
    }

    persist_session(engine, root)
}

pub fn cmd_tour(engine: &mut Engine, root: &Path, command: &TourCommand) -> Result<(), String> {
    match command {
        TourCommand::Rename { title } => {
            ensure_editable(engine)?;
            let tour = active_tour(engine)?;
            engine
                .change_tour_title(&tour, title.clone())
                .map_err(save_error)?;
        }
        TourCommand::Describe { description } => {
            ensure_editable(engine)?;
            let tour = active_tour(engine)?;
            engine
                .change_tour_description(&tour, description.clone())
                .map_err(save_error)?;
        }
        TourCommand::Primary { unset } => {
            ensure_editable(engine)?;
            let tour = active_tour(engine)?;
            if *unset {
                engine.unmake_primary(&tour).map_err(save_error)?;
            } else {
                engine.make_primary(&tour).map_err(save_error)?;
            }
        }
        TourCommand::Delete { title } => {
            let tour = match title {
                Some(title) => engine
                    .repository()
                    .find_by_title(title)
                    .ok_or_else(|| format!("no tour titled \"{title}\""))?,
                None => active_tour(engine)?,
            };
            let deleted_title = tour.borrow().title.clone();
            engine
                .delete_tour(&tour)
                .map_err(|e| format!("failed to delete tour: {e}"))?;
            println!("Deleted \"{deleted_title}\".");
        }
    }

    persist_session(engine, root)
}

fn save_error(e: impl std::fmt::Display) -> String {
    format!("failed to save tour: {e}")
}

/// Edits require the active tour to be editable; tours started from
/// outside the workspace are read-only.
fn ensure_editable(engine: &Engine) -> Result<(), String> {
    if engine.navigator().in_tour() && !engine.navigator().can_edit_tour() {
        return Err("the active tour is read-only".to_string());
    }
    Ok(())
}

fn active_tour(engine: &Engine) -> Result<SharedTour, String> {
    engine
        .navigator()
        .active()
        .map(|active| active.tour.clone())
        .ok_or_else(|| "no active tour (use `codewalk start`)".to_string())
}

/// Resolves a 1-based `--step` argument, defaulting to the cursor.
fn target_step(engine: &Engine, step: Option<usize>) -> Result<(SharedTour, usize), String> {
    let active = engine
        .navigator()
        .active()
        .ok_or_else(|| "no active tour (use `codewalk start`)".to_string())?;
    let tour = active.tour.clone();

    let index = match step {
        Some(n) => n
            .checked_sub(1)
            .ok_or_else(|| "step numbers start at 1".to_string())?,
        None => {
            usize::try_from(active.step).map_err(|_| "the tour has no steps yet".to_string())?
        }
    };

    let count = tour.borrow().steps.len();
    if index >= count {
        return Err(format!("no step {} (the tour has {count} steps)", index + 1));
    }
    Ok((tour, index))
}

impl DirectionArg {
    fn to_domain(self) -> crate::recorder::MoveDirection {
        match self {
            Self::Up => crate::recorder::MoveDirection::Up,
            Self::Down => crate::recorder::MoveDirection::Down,
        }
    }
}
