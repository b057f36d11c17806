//! Observer sync: pushes the true mute state to external sinks
//!
//! Every state change re-reads the hardware mute flag (never a cached value)
//! and hands it to the status notifier and the state file. Sink failures are
//! logged and never undo the toggle that caused them.

mod notifier;
mod state_file;

use std::path::PathBuf;

use tracing::{debug, error, warn};

use crate::audio::{MuteController, MuteError};
use crate::state::OperatingMode;

#[cfg(test)]
pub use notifier::recording;
pub use notifier::{CommandNotifier, StatusNotifier, DEFAULT_EVENT};
pub use state_file::{expand_tilde, StateFile, DEFAULT_STATE_FILE};

/// Errors raised by the observer layer
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("failed to invoke notifier {program:?}: {reason}")]
    NotifierInvocationFailed { program: String, reason: String },

    #[error("failed to write state file {path:?}: {source}")]
    StateFileWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read state file {path:?}: {source}")]
    StateFileReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state file {path:?} holds {contents:?}, expected true or false")]
    InvalidStateFile { path: PathBuf, contents: String },

    #[error("home directory could not be determined")]
    HomeDirUnavailable,

    #[error("could not read mute state: {0}")]
    MuteState(#[from] MuteError),
}

/// What the observers are told after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPayload {
    pub muted: bool,
    pub held: bool,
    pub mode: OperatingMode,
}

impl StatusPayload {
    /// `KEY=value` arguments; held and mode only when `extended`
    pub fn args(&self, extended: bool) -> Vec<String> {
        let mut args = vec![format!("MUTED={}", self.muted)];
        if extended {
            args.push(format!("HELD={}", self.held));
            args.push(format!("MODE={}", self.mode));
        }
        args
    }
}

/// Fans state changes out to the notifier and the state file
pub struct ObserverSync {
    mute: MuteController,
    notifier: Option<Box<dyn StatusNotifier>>,
    event: String,
    extended: bool,
    state_file: Option<StateFile>,
}

impl ObserverSync {
    pub fn new(mute: MuteController) -> Self {
        Self {
            mute,
            notifier: None,
            event: DEFAULT_EVENT.to_string(),
            extended: false,
            state_file: None,
        }
    }

    pub fn with_notifier(
        mut self,
        notifier: Box<dyn StatusNotifier>,
        event: impl Into<String>,
    ) -> Self {
        self.notifier = Some(notifier);
        self.event = event.into();
        self
    }

    /// Also report the held flag and operating mode
    pub fn with_extended_status(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn with_state_file(mut self, state_file: StateFile) -> Self {
        self.state_file = Some(state_file);
        self
    }

    /// Re-read the mute state and inform every sink.
    ///
    /// Only a failed hardware read is returned as an error; sink failures are
    /// logged and the remaining sinks still run.
    pub fn on_state_change(
        &self,
        mode: OperatingMode,
        held: bool,
    ) -> Result<StatusPayload, ObserverError> {
        let muted = self.mute.current_mute_state()?;
        let payload = StatusPayload { muted, held, mode };
        debug!(?payload, "syncing observers");

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(&self.event, &payload.args(self.extended)) {
                warn!(%e, "status notifier failed");
            }
        }

        if let Some(state_file) = &self.state_file {
            if let Err(e) = state_file.write(muted) {
                error!(%e, "state file not updated");
            }
        }

        Ok(payload)
    }
}
