//! Persisted mute flag
//!
//! A single file holding the literal text `true` or `false`, rewritten on
//! every state change. Single writer, no locking.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ObserverError;

/// Default location, relative to the home directory
pub const DEFAULT_STATE_FILE: &str = "~/.local/state/micmode/muted";

/// Expand a leading `~/` to the current user's home directory
pub fn expand_tilde(path: &str) -> Result<PathBuf, ObserverError> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or(ObserverError::HomeDirUnavailable)?;
            Ok(home.join(rest))
        }
        None if path == "~" => dirs::home_dir().ok_or(ObserverError::HomeDirUnavailable),
        None => Ok(PathBuf::from(path)),
    }
}

/// The one-line state file
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate and rewrite with `true` or `false`, creating the directory
    pub fn write(&self, muted: bool) -> Result<(), ObserverError> {
        let write_failed = |source| ObserverError::StateFileWriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(&self.path, if muted { "true" } else { "false" }).map_err(write_failed)?;

        debug!(path = ?self.path, muted, "state file written");
        Ok(())
    }

    /// Read the stored flag; `Ok(None)` if the file does not exist yet
    pub fn read(&self) -> Result<Option<bool>, ObserverError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ObserverError::StateFileReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match contents.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(ObserverError::InvalidStateFile {
                path: self.path.clone(),
                contents: other.to_string(),
            }),
        }
    }
}
