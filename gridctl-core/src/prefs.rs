//! Persisted view preferences.
//!
//! The platform this serves keeps UI preferences (theme, table page size) in
//! a per-user store that is read once at startup and lives for the process
//! lifetime. That store is an explicitly constructed value here, injected
//! where needed, so tests can supply isolated instances instead of sharing
//! ambient global state.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{GridError, Result};

/// Color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// User-facing view preferences, stored as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPrefs {
    pub theme: Theme,
    pub page_size: u64,
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewPrefs {
    /// Load preferences from a TOML file. A missing file is not an error;
    /// it yields the defaults, matching first-run behavior.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| GridError::prefs_parse(path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(GridError::prefs_io(path, e)),
        }
    }

    /// Persist preferences, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GridError::prefs_io(parent, e))?;
        }
        fs::write(path, text).map_err(|e| GridError::prefs_io(path, e))
    }
}
