//! Events module for state machine transitions
//!
//! Every handled gesture produces exactly one [`StateEvent`], broadcast in
//! the order the gestures occurred.

use serde::{Deserialize, Serialize};

use crate::gesture::Gesture;
use crate::state::OperatingMode;

/// Events emitted by the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Initial mode derived from the hardware mute state
    Initialized { mode: OperatingMode, muted: bool },

    /// Short press began and the microphone was toggled
    PressStarted { muted: bool },

    /// Short press ended and the microphone was toggled
    PressEnded { muted: bool },

    /// Double press flipped the operating mode
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// The hardware rejected the gesture's toggle; nothing changed
    GestureFailed { gesture: Gesture, reason: String },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::Initialized { mode, muted } => {
                write!(f, "INITIALIZED ({mode}, muted={muted})")
            }
            StateEvent::PressStarted { muted } => write!(f, "PRESS_STARTED (muted={muted})"),
            StateEvent::PressEnded { muted } => write!(f, "PRESS_ENDED (muted={muted})"),
            StateEvent::ModeChanged { from, to } => write!(f, "MODE_CHANGED ({from} -> {to})"),
            StateEvent::GestureFailed { gesture, reason } => {
                write!(f, "GESTURE_FAILED ({gesture}: {reason})")
            }
        }
    }
}
