//! Durable progress tracking: which steps of which tours were visited.
//!
//! Progress lives in a single SQLite database keyed by tour id, so it
//! survives tour restarts and process restarts. It is independent of the
//! active cursor's lifetime. Tour ids are derived from file locations, so
//! progress is orphaned when a tour file moves — an accepted limitation.

use std::{fs, io, path::Path, path::PathBuf};

use rusqlite::Connection;

/// Errors that can occur while reading or writing progress.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, ProgressError>;

/// Durable record of visited `(tour id, step index)` pairs.
pub struct ProgressTracker {
    conn: Connection,
}

impl ProgressTracker {
    /// Opens (or creates) the progress database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// An in-memory tracker, used by tests and ephemeral hosts.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS progress (
                tour_id TEXT NOT NULL,
                step INTEGER NOT NULL,
                visited_at TEXT NOT NULL,
                PRIMARY KEY (tour_id, step)
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// The default database location: `~/.codewalk/progress.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".codewalk").join("progress.sqlite"))
    }

    /// Records a visit. Idempotent: revisiting a step is a no-op.
    pub fn mark_visited(&self, tour_id: &str, step: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO progress (tour_id, step, visited_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![tour_id, step, jiff::Timestamp::now().to_string()],
        )?;
        Ok(())
    }

    /// The distinct visited step indices for a tour, in ascending order.
    pub fn visited(&self, tour_id: &str) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT step FROM progress WHERE tour_id = ?1 ORDER BY step")?;
        let steps = stmt
            .query_map([tour_id], |row| row.get(0))?
            .collect::<core::result::Result<Vec<i64>, _>>()?;
        Ok(steps)
    }

    /// Whether a specific step was visited.
    pub fn is_step_complete(&self, tour_id: &str, step: i64) -> bool {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM progress WHERE tour_id = ?1 AND step = ?2",
                rusqlite::params![tour_id, step],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    /// Whether a whole tour counts as complete.
    ///
    /// A count comparison, not set equality: visited count >= current step
    /// count. Editing steps after completion can therefore leave a tour
    /// "complete" without every current step being visited.
    pub fn is_complete(&self, tour_id: &str, step_count: usize) -> bool {
        let visited = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM progress WHERE tour_id = ?1",
                [tour_id],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0);

        usize::try_from(visited).is_ok_and(|count| count >= step_count)
    }

    /// Forgets one tour's progress, or everything when no id is given.
    pub fn reset(&self, tour_id: Option<&str>) -> Result<()> {
        match tour_id {
            Some(id) => self
                .conn
                .execute("DELETE FROM progress WHERE tour_id = ?1", [id])?,
            None => self.conn.execute("DELETE FROM progress", [])?,
        };
        Ok(())
    }

    /// Whether any progress exists at all.
    pub fn has_any(&self) -> bool {
        self.conn
            .query_row("SELECT COUNT(*) FROM progress", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|count| count > 0)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ProgressTracker {
        ProgressTracker::in_memory().unwrap()
    }

    #[test]
    fn marking_is_idempotent() {
        let progress = tracker();
        progress.mark_visited("/t/a.tour", 3).unwrap();
        progress.mark_visited("/t/a.tour", 3).unwrap();

        assert_eq!(progress.visited("/t/a.tour").unwrap(), vec![3]);
    }

    #[test]
    fn visited_steps_come_back_sorted() {
        let progress = tracker();
        for step in [2, 0, 1] {
            progress.mark_visited("/t/a.tour", step).unwrap();
        }

        assert_eq!(progress.visited("/t/a.tour").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn completion_is_a_count_comparison() {
        let progress = tracker();
        progress.mark_visited("/t/a.tour", 0).unwrap();
        progress.mark_visited("/t/a.tour", 1).unwrap();
        progress.mark_visited("/t/a.tour", 2).unwrap();

        assert!(progress.is_complete("/t/a.tour", 3));

        // A step was deleted since completion: the visited set {0,1,2}
        // doesn't match the remaining steps, but the count still clears
        // the bar.
        assert!(progress.is_complete("/t/a.tour", 2));

        // A step was added: no longer complete.
        assert!(!progress.is_complete("/t/a.tour", 4));
    }

    #[test]
    fn step_level_completion() {
        let progress = tracker();
        progress.mark_visited("/t/a.tour", 1).unwrap();

        assert!(progress.is_step_complete("/t/a.tour", 1));
        assert!(!progress.is_step_complete("/t/a.tour", 0));
        assert!(!progress.is_step_complete("/t/other.tour", 1));
    }

    #[test]
    fn reset_one_tour_keeps_the_rest() {
        let progress = tracker();
        progress.mark_visited("/t/a.tour", 0).unwrap();
        progress.mark_visited("/t/b.tour", 0).unwrap();

        progress.reset(Some("/t/a.tour")).unwrap();

        assert!(progress.visited("/t/a.tour").unwrap().is_empty());
        assert_eq!(progress.visited("/t/b.tour").unwrap(), vec![0]);
        assert!(progress.has_any());
    }

    #[test]
    fn reset_everything() {
        let progress = tracker();
        progress.mark_visited("/t/a.tour", 0).unwrap();
        progress.mark_visited("/t/b.tour", 5).unwrap();

        progress.reset(None).unwrap();
        assert!(!progress.has_any());
    }

    #[test]
    fn progress_survives_reopening() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("progress.sqlite");

        {
            let progress = ProgressTracker::open(&path).unwrap();
            progress.mark_visited("/t/a.tour", 0).unwrap();
        }

        let progress = ProgressTracker::open(&path).unwrap();
        assert_eq!(progress.visited("/t/a.tour").unwrap(), vec![0]);
    }
}
