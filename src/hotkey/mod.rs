//! Hotkey module for global keyboard event listening
//!
//! Uses macOS CGEventTap to watch one key combination and reports each
//! press and release as a timestamped [`HotkeyEvent`].

mod keys;
#[cfg(target_os = "macos")]
mod listener;

use std::time::Instant;

pub use keys::{codes, Hotkey, Modifiers, ParseHotkeyError};
#[cfg(target_os = "macos")]
pub use listener::HotkeyListener;

/// Whether the hotkey went down or came back up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Down,
    Up,
}

/// One press or release of the hotkey, stamped when it was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEvent {
    pub kind: KeyKind,
    pub at: Instant,
}

impl HotkeyEvent {
    pub fn new(kind: KeyKind, at: Instant) -> Self {
        Self { kind, at }
    }

    pub fn down(at: Instant) -> Self {
        Self::new(KeyKind::Down, at)
    }

    pub fn up(at: Instant) -> Self {
        Self::new(KeyKind::Up, at)
    }
}

/// What the event tap does with one keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    /// Swallow the event and report it as a press or release
    Forward(KeyKind),
    /// Swallow the event without reporting it (auto-repeat)
    Swallow,
    /// Not ours, let it through to the focused app
    PassThrough,
}

/// Decides which raw key events belong to the hotkey.
///
/// A press needs the exact modifier set. The release is matched on key code
/// alone, since the modifier may already be up, and only after a forwarded
/// press, so every forwarded Down is followed by at most one Up.
#[derive(Debug, Clone)]
pub struct PressFilter {
    hotkey: Hotkey,
    pressed: bool,
}

impl PressFilter {
    pub fn new(hotkey: Hotkey) -> Self {
        Self {
            hotkey,
            pressed: false,
        }
    }

    pub fn accept(
        &mut self,
        kind: KeyKind,
        modifiers: Modifiers,
        key_code: u16,
        autorepeat: bool,
    ) -> TapAction {
        match kind {
            KeyKind::Down => {
                if !self.hotkey.matches(modifiers, key_code) {
                    return TapAction::PassThrough;
                }
                if autorepeat {
                    return TapAction::Swallow;
                }
                self.pressed = true;
            }
            KeyKind::Up => {
                if key_code != self.hotkey.key_code || !self.pressed {
                    return TapAction::PassThrough;
                }
                self.pressed = false;
            }
        }
        TapAction::Forward(kind)
    }
}

/// Errors that can occur while registering or running the hotkey listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("failed to send event to channel")]
    ChannelSend,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PressFilter {
        PressFilter::new(Hotkey::default())
    }

    #[test]
    fn test_press_and_release_forwarded() {
        let mut filter = filter();
        assert_eq!(
            filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, false),
            TapAction::Forward(KeyKind::Down)
        );
        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::TAB, false),
            TapAction::Forward(KeyKind::Up)
        );
    }

    #[test]
    fn test_autorepeat_down_swallowed() {
        let mut filter = filter();
        filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, false);

        for _ in 0..5 {
            assert_eq!(
                filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, true),
                TapAction::Swallow
            );
        }
        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::TAB, false),
            TapAction::Forward(KeyKind::Up)
        );
    }

    #[test]
    fn test_release_after_modifier_up_forwarded() {
        let mut filter = filter();
        filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, false);

        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::default(), codes::TAB, false),
            TapAction::Forward(KeyKind::Up)
        );
    }

    #[test]
    fn test_release_without_press_passes_through() {
        let mut filter = filter();
        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::TAB, false),
            TapAction::PassThrough
        );

        // A second release after the forwarded one is not ours either
        filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, false);
        filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::TAB, false);
        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::TAB, false),
            TapAction::PassThrough
        );
    }

    #[test]
    fn test_extra_modifier_passes_through() {
        let mut filter = filter();
        let mods = Modifiers {
            control: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(
            filter.accept(KeyKind::Down, mods, codes::TAB, false),
            TapAction::PassThrough
        );
        assert_eq!(
            filter.accept(KeyKind::Up, mods, codes::TAB, false),
            TapAction::PassThrough
        );
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut filter = filter();
        filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::TAB, false);

        assert_eq!(
            filter.accept(KeyKind::Down, Modifiers::CONTROL, codes::SPACE, false),
            TapAction::PassThrough
        );
        assert_eq!(
            filter.accept(KeyKind::Up, Modifiers::CONTROL, codes::SPACE, false),
            TapAction::PassThrough
        );
    }
}
