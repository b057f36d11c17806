//! State machine module for mode management
//!
//! Tracks the operating mode and held flag:
//! - PushToTalk: microphone muted except while the hotkey is held
//! - PushToStay: microphone left open
//!
//! A double press switches between the two.

mod machine;

pub use machine::{OperatingMode, StateMachine};
