//! CLI-host session persistence: the cursor between invocations.
//!
//! The engine keeps the active tour in memory; a CLI process ends after
//! every command, so the host writes the cursor to
//! `.codewalk/session.json` in the workspace and restores it on the next
//! invocation. A missing file is a valid idle state. The file is removed
//! when the tour ends.

use std::{fs, io, path::Path, path::PathBuf};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Errors that can occur during session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, SessionError>;

/// The persisted cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub tour_id: String,
    pub step: i32,
    pub recording: bool,
    pub saved_at: Timestamp,
}

fn session_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".codewalk").join("session.json")
}

/// Loads the session, if one exists.
pub fn load(workspace_root: &Path) -> Result<Option<Session>> {
    let path = session_path(workspace_root);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&json)?))
}

/// Writes the session, creating `.codewalk/` if needed.
pub fn save(workspace_root: &Path, session: &Session) -> Result<()> {
    let path = session_path(workspace_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    fs::write(path, json)?;
    Ok(())
}

/// Removes the session. Idempotent: a missing file is fine.
pub fn clear(workspace_root: &Path) -> Result<()> {
    let path = session_path(workspace_root);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
