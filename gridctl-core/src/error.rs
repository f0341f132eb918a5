//! Structured error types for gridctl-core.
//!
//! Uses `thiserror` for composable library errors. Nothing here crosses the
//! controller boundary as a panic or a thrown value; fetch failures surface
//! on the view-model and preference-store failures return `Result`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gridctl-core operations
#[derive(Error, Debug)]
pub enum GridError {
    /// A remote fetch failed
    #[error("fetch failed: {reason}")]
    Fetch { reason: String },

    /// Operation invoked on a disposed controller
    #[error("controller has been disposed")]
    Disposed,

    /// Preference file could not be read or written
    #[error("preferences I/O error at {path:?}: {source}")]
    PrefsIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Preference file is not valid TOML
    #[error("invalid preferences file {path:?}: {source}")]
    PrefsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Preferences could not be serialized
    #[error("failed to serialize preferences: {source}")]
    PrefsEncode {
        #[from]
        source: toml::ser::Error,
    },
}

/// Result type alias for gridctl-core operations
pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    /// Create a fetch error from any displayable reason
    pub fn fetch(reason: impl Into<String>) -> Self {
        Self::Fetch {
            reason: reason.into(),
        }
    }

    /// Create a preferences I/O error with path context
    pub fn prefs_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::PrefsIo {
            path: path.into(),
            source,
        }
    }

    /// Create a preferences parse error with path context
    pub fn prefs_parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::PrefsParse {
            path: path.into(),
            source,
        }
    }
}
