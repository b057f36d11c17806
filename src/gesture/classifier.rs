//! Press-pattern classification
//!
//! Timing is a pure function of the last key-down timestamp: a key-down
//! closer than the threshold to the previous key-down is a double press,
//! anything else starts a short press. Key-ups always end a short press.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hotkey::{HotkeyEvent, KeyKind};

/// Default window between two key-downs for a double press
pub const DOUBLE_PRESS_THRESHOLD: Duration = Duration::from_millis(300);

/// A classified hotkey gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Key went down, outside the double-press window
    ShortPressStart,
    /// Key came up
    ShortPressEnd,
    /// Key went down within the window of the previous key-down
    DoublePress,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::ShortPressStart => write!(f, "SHORT_PRESS_START"),
            Gesture::ShortPressEnd => write!(f, "SHORT_PRESS_END"),
            Gesture::DoublePress => write!(f, "DOUBLE_PRESS"),
        }
    }
}

/// Turns raw key-down/key-up events into gestures
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    threshold: Duration,
    /// Time of the most recent key-down
    last_down: Option<Instant>,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DOUBLE_PRESS_THRESHOLD)
    }
}

impl GestureClassifier {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_down: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Classify one event. Every event yields exactly one gesture.
    pub fn classify(&mut self, event: HotkeyEvent) -> Gesture {
        let gesture = match event.kind {
            KeyKind::Down => {
                let double = self
                    .last_down
                    .map(|prev| event.at.saturating_duration_since(prev) < self.threshold)
                    .unwrap_or(false);
                // The window always restarts from the newest key-down
                self.last_down = Some(event.at);

                if double {
                    Gesture::DoublePress
                } else {
                    Gesture::ShortPressStart
                }
            }
            KeyKind::Up => Gesture::ShortPressEnd,
        };

        debug!(kind = ?event.kind, %gesture, "classified hotkey event");
        gesture
    }
}
