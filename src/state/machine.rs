//! Core state machine
//!
//! Owns the operating mode and held flag and is the only place they change.
//! Each hotkey event is classified, applied, and followed by one observer
//! sync before the next event is looked at.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::audio::{MuteController, MuteError};
use crate::events::StateEvent;
use crate::gesture::{Gesture, GestureClassifier};
use crate::hotkey::HotkeyEvent;
use crate::observer::ObserverSync;

/// Displayed operating mode.
///
/// Observational only: the microphone is toggled on press and on release in
/// both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Muted by default, open while the hotkey is held
    PushToTalk,
    /// Open by default
    PushToStay,
}

impl OperatingMode {
    /// Mode implied by the hardware state at startup
    pub fn from_muted(muted: bool) -> Self {
        if muted {
            OperatingMode::PushToTalk
        } else {
            OperatingMode::PushToStay
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            OperatingMode::PushToTalk => OperatingMode::PushToStay,
            OperatingMode::PushToStay => OperatingMode::PushToTalk,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::PushToTalk => write!(f, "PTT"),
            OperatingMode::PushToStay => write!(f, "PTS"),
        }
    }
}

/// The state machine that turns hotkey gestures into mute toggles
pub struct StateMachine {
    mode: OperatingMode,
    /// Key is physically down (as of the last successful gesture)
    held: bool,
    classifier: GestureClassifier,
    mute: MuteController,
    observer: ObserverSync,
    event_tx: broadcast::Sender<StateEvent>,
}

impl StateMachine {
    /// Read the hardware mute state and derive the initial mode from it.
    ///
    /// Fails if the mute state cannot be read; there is no sane initial mode
    /// without it.
    pub fn initialize(
        mute: MuteController,
        observer: ObserverSync,
        classifier: GestureClassifier,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self, MuteError> {
        let muted = mute.current_mute_state()?;
        let mode = OperatingMode::from_muted(muted);
        info!(%mode, muted, "initial mode set from microphone state");

        let machine = Self {
            mode,
            held: false,
            classifier,
            mute,
            observer,
            event_tx,
        };
        machine.emit(StateEvent::Initialized { mode, muted });
        machine.sync_observers();

        Ok(machine)
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn held(&self) -> bool {
        self.held
    }

    /// Process hotkey events until the sender side is dropped
    pub async fn run(&mut self, mut hotkey_rx: mpsc::Receiver<HotkeyEvent>) {
        info!(mode = %self.mode, "state machine started");

        while let Some(event) = hotkey_rx.recv().await {
            // Hardware and notifier calls block; finish them before the next
            // event is accepted.
            tokio::task::block_in_place(|| self.handle_event(event));
        }

        info!("state machine stopped");
    }

    /// Classify and apply one hotkey event
    pub fn handle_event(&mut self, event: HotkeyEvent) -> Gesture {
        let gesture = self.classifier.classify(event);

        let outcome = match gesture {
            Gesture::ShortPressStart => self.on_short_press_start(),
            Gesture::ShortPressEnd => self.on_short_press_end(),
            Gesture::DoublePress => Ok(self.on_double_press()),
        };

        match outcome {
            Ok(state_event) => self.emit(state_event),
            Err(e) => {
                warn!(%gesture, error = %e, "gesture failed, waiting for next press");
                self.emit(StateEvent::GestureFailed {
                    gesture,
                    reason: e.to_string(),
                });
            }
        }

        self.sync_observers();
        gesture
    }

    fn on_short_press_start(&mut self) -> Result<StateEvent, MuteError> {
        let muted = self.mute.toggle()?;
        self.held = true;
        Ok(StateEvent::PressStarted { muted })
    }

    fn on_short_press_end(&mut self) -> Result<StateEvent, MuteError> {
        let muted = self.mute.toggle()?;
        self.held = false;
        Ok(StateEvent::PressEnded { muted })
    }

    fn on_double_press(&mut self) -> StateEvent {
        let from = self.mode;
        self.mode = from.flipped();
        info!(%from, to = %self.mode, "double press: mode changed");
        StateEvent::ModeChanged {
            from,
            to: self.mode,
        }
    }

    fn emit(&self, event: StateEvent) {
        debug!(%event, "emitting state event");
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    fn sync_observers(&self) {
        if let Err(e) = self.observer.on_state_change(self.mode, self.held) {
            warn!(%e, "observers not updated");
        }
    }
}
