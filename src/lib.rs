//! micmode: push-to-talk microphone control from a global hotkey
//!
//! Building blocks of the `micmode-daemon` binary:
//! - Global hotkey detection via CGEventTap
//! - Gesture classification (short press vs double press)
//! - State machine driving the input mute flag and operating mode
//! - Observer sync to a status bar and a one-line state file

pub mod audio;
pub mod config;
pub mod events;
pub mod gesture;
pub mod hotkey;
pub mod lifecycle;
pub mod observer;
pub mod state;
