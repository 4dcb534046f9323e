//! Codewalk configuration.
//!
//! Loaded from `~/.codewalk/config.toml`. A missing file means defaults;
//! an unreadable or invalid one is an error worth telling the user about.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Codewalk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Whether marker comments in source files are scraped into step
    /// titles and used to locate marker steps.
    pub show_markers: bool,

    /// Overrides the directory holding the progress database.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_markers: true,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load config from `~/.codewalk/config.toml`, defaulting when absent.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.codewalk/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".codewalk").join("config.toml"))
    }

    /// Where the progress database lives, honoring `data-dir`.
    pub fn progress_path(&self) -> Option<PathBuf> {
        match &self.data_dir {
            Some(dir) => Some(dir.join("progress.sqlite")),
            None => crate::progress::ProgressTracker::default_path(),
        }
    }
}
