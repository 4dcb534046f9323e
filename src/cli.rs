//! CLI interface for Codewalk.
//!
//! Each subcommand is non-interactive: arguments in, rendered step out.
//! The active tour survives between invocations through a session file in
//! the workspace's `.codewalk/` directory, so `start`, `next`, and `end`
//! compose into a walk.
//!
//! Commands split into two groups:
//!
//! - `codewalk list|start|show|next|prev|end` — taking a tour.
//! - `codewalk record|add|step|tour` — recording and editing one.

mod format;
mod record;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;

use crate::config::Config;
use crate::engine::Engine;
use crate::engine::events::EngineEvent;
use crate::engine::navigator::StartOptions;
use crate::git;
use crate::markers;
use crate::model::SharedTour;
use crate::repository;
use crate::session::{self, Session};
use crate::status;

/// Codewalk — guided walks through a codebase.
#[derive(Debug, Parser)]
#[command(name = "codewalk", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Workspace root containing the tours. Defaults to the current directory.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r##"Workflow: taking a tour
  1. codewalk list
  2. codewalk start "Getting started"
  3. codewalk next          (repeat; `codewalk show` re-prints the step)
  4. codewalk end

Workflow: recording a tour
  1. codewalk record "#1 - Internals" --ref branch
  2. codewalk add file src/main.rs --line 10
  3. codewalk step describe "This is where it all starts"
  4. codewalk end"##;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the workspace's tours with progress.
    List {
        /// Also list every step, with a checkmark per visited step.
        #[arg(long)]
        steps: bool,
    },

    /// Start a tour. Without a title, the primary tour starts.
    Start {
        /// Tour title (raw or with the "#N -" prefix stripped).
        title: Option<String>,

        /// 1-based step to start at.
        #[arg(long)]
        step: Option<usize>,

        /// A source line containing a marker token (e.g. `// CT1.2`);
        /// the walk starts at the step the marker names.
        #[arg(long, conflicts_with = "step")]
        at: Option<String>,
    },

    /// Show the current step again.
    Show,

    /// Move to the next step, or into the next linked tour at the end.
    Next,

    /// Move to the previous step, or back into the previous linked tour.
    Prev,

    /// End the active tour.
    End {
        /// Also export the tour, with file contents embedded, to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Create a new tour and start recording into it.
    Record {
        /// Title for the new tour (a "#N - " prefix enables chaining).
        title: String,

        /// Pin file steps to a ref: "branch", "commit", or any ref name.
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },

    /// Add a step after the current one (recording only).
    Add {
        #[command(subcommand)]
        step: AddStep,
    },

    /// Edit a step of the active tour.
    Step {
        #[command(subcommand)]
        command: StepCommand,
    },

    /// Edit or delete a tour.
    Tour {
        #[command(subcommand)]
        command: TourCommand,
    },

    /// Export a tour with file contents embedded.
    Export {
        /// Tour title; defaults to the active tour.
        title: Option<String>,

        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Reset visited-step progress.
    Reset {
        /// Tour title; resets every tour when omitted.
        title: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AddStep {
    /// A step anchored to a file.
    File {
        /// Path relative to the workspace root.
        file: String,

        /// 1-based line to anchor at. Without it the step anchors to a
        /// marker token or the end of the file.
        #[arg(long)]
        line: Option<u32>,
    },

    /// A virtual-content step with no backing file.
    Content {
        /// Step title, shown as the virtual document's name.
        title: String,
    },

    /// A step revealing a directory.
    Directory {
        /// Path relative to the workspace root.
        directory: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum StepCommand {
    /// Replace a step's description.
    Describe {
        description: String,

        /// 1-based step number; defaults to the current step.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Set or clear a step's title (empty clears).
    Title {
        title: String,

        /// 1-based step number; defaults to the current step.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Re-anchor a file step to a line.
    Line {
        /// 1-based line number.
        line: u32,

        /// 1-based step number; defaults to the current step.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Move a step up or down. The cursor follows a moved current step.
    Move {
        #[arg(value_enum)]
        direction: DirectionArg,

        /// 1-based step number; defaults to the current step.
        #[arg(long)]
        step: Option<usize>,
    },

    /// Delete steps by 1-based number (any order).
    Delete {
        #[arg(required = true)]
        steps: Vec<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TourCommand {
    /// Rename the active tour, keeping links from other tours intact.
    Rename { title: String },

    /// Replace the active tour's description (empty clears).
    Describe { description: String },

    /// Flag the active tour as the workspace's primary tour.
    Primary {
        /// Remove the flag instead.
        #[arg(long)]
        unset: bool,
    },

    /// Delete a tour and its backing file.
    Delete {
        /// Tour title; defaults to the active tour.
        title: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let root = cli.workspace.clone().unwrap_or_else(|| PathBuf::from("."));

    let config = Config::load()?;
    let mut engine = Engine::new(vec![root.clone()], config)
        .map_err(|e| format!("failed to open progress database: {e}"))?;
    engine.refresh();

    match cli.command {
        Command::List { steps } => cmd_list(&engine, steps),
        Command::Start { title, step, at } => {
            cmd_start(&mut engine, &root, title.as_deref(), step, at.as_deref())
        }
        Command::Show => {
            resume(&mut engine, &root)?;
            cmd_show(&engine, &root)
        }
        Command::Next => {
            resume(&mut engine, &root)?;
            cmd_next(&mut engine, &root)
        }
        Command::Prev => {
            resume(&mut engine, &root)?;
            cmd_prev(&mut engine, &root)
        }
        Command::End { export } => {
            resume(&mut engine, &root)?;
            cmd_end(&mut engine, &root, export.as_deref())
        }
        Command::Record { title, git_ref } => {
            record::cmd_record(&mut engine, &root, &title, git_ref.as_deref())
        }
        Command::Add { step } => {
            resume(&mut engine, &root)?;
            record::cmd_add(&mut engine, &root, &step)
        }
        Command::Step { command } => {
            resume(&mut engine, &root)?;
            record::cmd_step(&mut engine, &root, &command)
        }
        Command::Tour { command } => {
            // Tours can be deleted by title without an active session.
            try_resume(&mut engine, &root)?;
            record::cmd_tour(&mut engine, &root, &command)
        }
        Command::Export { title, out } => {
            try_resume(&mut engine, &root)?;
            cmd_export(&engine, title.as_deref(), out.as_deref())
        }
        Command::Reset { title } => cmd_reset(&engine, title.as_deref()),
    }
}

/// Restores the persisted cursor, failing when there is none.
fn resume(engine: &mut Engine, root: &Path) -> Result<(), String> {
    try_resume(engine, root)?;
    if !engine.navigator().in_tour() {
        return Err("no active tour (use `codewalk start`)".to_string());
    }
    Ok(())
}

/// Restores the persisted cursor if a session exists. A session pointing
/// at a deleted tour is cleared rather than reported.
fn try_resume(engine: &mut Engine, root: &Path) -> Result<(), String> {
    let session = session::load(root).map_err(|e| format!("failed to read session: {e}"))?;
    let Some(session) = session else {
        return Ok(());
    };

    let Some(tour) = engine.repository().find(&session.tour_id) else {
        session::clear(root).map_err(|e| format!("failed to clear session: {e}"))?;
        return Ok(());
    };

    engine.start_tour(
        tour,
        StartOptions {
            step: Some(session.step),
            start_recording: session.recording,
            ..StartOptions::default()
        },
    );
    Ok(())
}

/// Writes the cursor back for the next invocation, or clears it when the
/// tour has ended.
fn persist_session(engine: &Engine, root: &Path) -> Result<(), String> {
    let result = match engine.navigator().active() {
        Some(active) => session::save(
            root,
            &Session {
                tour_id: active.tour.borrow().id.clone(),
                step: active.step,
                recording: engine.navigator().is_recording(),
                saved_at: Timestamp::now(),
            },
        ),
        None => session::clear(root),
    };
    result.map_err(|e| format!("failed to persist session: {e}"))
}

/// Prints each step as the engine enters it.
fn subscribe_renderer(engine: &Engine, root: &Path) {
    let root = root.to_path_buf();
    let git = git::open(Some(&root));

    engine.events().subscribe(move |event| match event {
        EngineEvent::TourStarted { tour, step } => {
            println!(
                "{}",
                format::render_step(&tour.borrow(), *step, Some(&root), git.as_ref())
            );
        }
        EngineEvent::TourEnded { tour } => {
            println!("Finished \"{}\".", tour.borrow().display_title());
        }
        EngineEvent::ToursChanged => {}
    });
}

/// Prints the status line for the active tour, if any.
fn print_status(engine: &Engine) {
    if let Some(status) = status::status_line(engine.navigator()) {
        println!("{status}");
    }
}

fn cmd_list(engine: &Engine, with_steps: bool) -> Result<(), String> {
    if !engine.repository().has_tours() {
        println!("No tours in this workspace.");
        return Ok(());
    }

    for tour in engine.repository().tours() {
        let tour_ref = tour.borrow();
        let visited = engine
            .progress()
            .visited(&tour_ref.id)
            .map(|v| v.len())
            .unwrap_or(0);
        let complete = engine.is_tour_complete(tour);
        println!("{}", format::tour_line(&tour_ref, visited, complete));

        if with_steps {
            for step_number in 0..tour_ref.steps.len() {
                let step = i64::try_from(step_number).unwrap_or(i64::MAX);
                let visited = engine.progress().is_step_complete(&tour_ref.id, step);
                println!("{}", format::step_line(&tour_ref, step_number, visited));
            }
        }
    }
    Ok(())
}

fn cmd_start(
    engine: &mut Engine,
    root: &Path,
    title: Option<&str>,
    step: Option<usize>,
    at: Option<&str>,
) -> Result<(), String> {
    let tour = match title {
        Some(title) => engine
            .repository()
            .find_by_title(title)
            .ok_or_else(|| format!("no tour titled \"{title}\" (see `codewalk list`)"))?,
        None => default_tour(engine)?,
    };

    let step = start_step(&tour, step, at)?;
    subscribe_renderer(engine, root);
    engine.start_tour(tour, StartOptions {
        step,
        ..StartOptions::default()
    });
    print_status(engine);
    persist_session(engine, root)
}

/// The tour `start` picks without a title: the primary tour, or the only
/// tour there is.
fn default_tour(engine: &Engine) -> Result<SharedTour, String> {
    if let Some(primary) = engine.repository().primary() {
        return Ok(primary);
    }
    match engine.repository().tours() {
        [only] => Ok(only.clone()),
        [] => Err("no tours in this workspace".to_string()),
        _ => Err("multiple tours and none is primary; pass a title (see `codewalk list`)"
            .to_string()),
    }
}

fn start_step(
    tour: &SharedTour,
    step: Option<usize>,
    at: Option<&str>,
) -> Result<Option<i32>, String> {
    let count = tour.borrow().steps.len();

    let number = match (step, at) {
        (Some(n), _) => Some(n),
        (None, Some(line_text)) => Some(
            markers::marker_for_line(&tour.borrow(), line_text)
                .ok_or_else(|| format!("no marker token of this tour in {line_text:?}"))?,
        ),
        (None, None) => None,
    };

    match number {
        None => Ok(None),
        Some(n) if n >= 1 && n <= count => {
            Ok(Some(i32::try_from(n - 1).map_err(|_| "step out of range".to_string())?))
        }
        Some(n) => Err(format!("no step {n} (the tour has {count} steps)")),
    }
}

fn cmd_show(engine: &Engine, root: &Path) -> Result<(), String> {
    let active = engine
        .navigator()
        .active()
        .ok_or_else(|| "no active tour".to_string())?;

    let git = git::open(Some(root));
    print_status(engine);
    println!(
        "{}",
        format::render_step(
            &active.tour.borrow(),
            active.step,
            active.workspace_root.as_deref().or(Some(root)),
            git.as_ref()
        )
    );
    Ok(())
}

fn cmd_next(engine: &mut Engine, root: &Path) -> Result<(), String> {
    let (step, count) = cursor_position(engine)?;

    subscribe_renderer(engine, root);
    if step + 1 < count {
        engine.advance();
    } else if let Some(next) = engine.next_tour() {
        println!("Continuing into \"{}\".", next.borrow().display_title());
        engine.jump_to_tour(next, StartOptions::default());
    } else {
        return Err("already at the last step (use `codewalk end` to finish)".to_string());
    }

    print_status(engine);
    persist_session(engine, root)
}

fn cmd_prev(engine: &mut Engine, root: &Path) -> Result<(), String> {
    let (step, _) = cursor_position(engine)?;

    subscribe_renderer(engine, root);
    if step > 0 {
        engine.retreat();
    } else if let Some(previous) = engine.previous_tour() {
        println!("Back into \"{}\".", previous.borrow().display_title());
        let last = previous.borrow().steps.len();
        let step = last.checked_sub(1).and_then(|s| i32::try_from(s).ok());
        engine.jump_to_tour(previous, StartOptions {
            step,
            ..StartOptions::default()
        });
    } else {
        return Err("already at the first step".to_string());
    }

    print_status(engine);
    persist_session(engine, root)
}

fn cursor_position(engine: &Engine) -> Result<(i32, i32), String> {
    let active = engine
        .navigator()
        .active()
        .ok_or_else(|| "no active tour".to_string())?;
    let count = i32::try_from(active.tour.borrow().steps.len())
        .map_err(|_| "tour too large".to_string())?;
    Ok((active.step, count))
}

fn cmd_end(engine: &mut Engine, root: &Path, export: Option<&Path>) -> Result<(), String> {
    subscribe_renderer(engine, root);
    let tour = engine.end_tour();

    if engine.is_tour_complete(&tour) {
        println!("Every step visited.");
    }
    persist_session(engine, root)?;

    if let Some(out) = export {
        export_to(engine, &tour, Some(out))?;
    }
    Ok(())
}

fn cmd_export(engine: &Engine, title: Option<&str>, out: Option<&Path>) -> Result<(), String> {
    let tour = match title {
        Some(title) => engine
            .repository()
            .find_by_title(title)
            .ok_or_else(|| format!("no tour titled \"{title}\""))?,
        None => engine
            .navigator()
            .active()
            .map(|active| active.tour.clone())
            .ok_or_else(|| "no active tour; pass a title".to_string())?,
    };
    export_to(engine, &tour, out)
}

fn export_to(engine: &Engine, tour: &SharedTour, out: Option<&Path>) -> Result<(), String> {
    let tour = tour.borrow();
    let workspace_root = engine.repository().workspace_root_for(&tour);
    let git = git::open(workspace_root.as_deref());

    let json = repository::export_tour(&tour, workspace_root.as_deref(), git.as_ref())
        .map_err(|e| format!("failed to export tour: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Exported \"{}\" to {}", tour.display_title(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_reset(engine: &Engine, title: Option<&str>) -> Result<(), String> {
    if title.is_none() && !engine.progress().has_any() {
        println!("No progress recorded.");
        return Ok(());
    }

    let tour_id = match title {
        Some(title) => {
            let tour = engine
                .repository()
                .find_by_title(title)
                .ok_or_else(|| format!("no tour titled \"{title}\""))?;
            let id = tour.borrow().id.clone();
            Some(id)
        }
        None => None,
    };

    engine
        .progress()
        .reset(tour_id.as_deref())
        .map_err(|e| format!("failed to reset progress: {e}"))?;

    match title {
        Some(title) => println!("Progress reset for \"{title}\"."),
        None => println!("Progress reset."),
    }
    Ok(())
}
