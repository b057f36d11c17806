//! Gesture classification for hotkey press patterns
//!
//! Distinguishes a short press (down ... up) from a double press (two
//! key-downs inside the double-press window).

mod classifier;

pub use classifier::{Gesture, GestureClassifier, DOUBLE_PRESS_THRESHOLD};
