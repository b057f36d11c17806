//! Configuration loading and management
//!
//! Everything comes from the environment with built-in defaults; there is no
//! configuration file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::gesture::DOUBLE_PRESS_THRESHOLD;
use crate::hotkey::Hotkey;
use crate::observer::{expand_tilde, DEFAULT_EVENT, DEFAULT_STATE_FILE};

/// Default pause between writing the mute flag and verifying it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default status notifier program
pub const DEFAULT_NOTIFIER: &str = "sketchybar";

/// Value that disables an optional sink
const DISABLED: &str = "none";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Key combination to listen for
    pub hotkey: Hotkey,

    /// Two key-downs closer than this are a double press
    pub double_press_threshold: Duration,

    /// Pause before verifying a mute write
    pub settle_delay: Duration,

    /// Notifier program, `None` when disabled
    pub notifier: Option<String>,

    /// Event name passed to the notifier
    pub notify_event: String,

    /// Include held flag and mode in notifications
    pub extended_status: bool,

    /// Persisted mute flag, `None` when disabled
    pub state_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: Hotkey::default(),
            double_press_threshold: DOUBLE_PRESS_THRESHOLD,
            settle_delay: DEFAULT_SETTLE_DELAY,
            notifier: Some(DEFAULT_NOTIFIER.to_string()),
            notify_event: DEFAULT_EVENT.to_string(),
            extended_status: false,
            state_file: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("MICMODE_HOTKEY") {
            config.hotkey = value
                .parse()
                .with_context(|| format!("invalid MICMODE_HOTKEY {value:?}"))?;
        }

        if let Some(value) = lookup("MICMODE_DOUBLE_PRESS_MS") {
            config.double_press_threshold = parse_millis("MICMODE_DOUBLE_PRESS_MS", &value)?;
        }

        if let Some(value) = lookup("MICMODE_SETTLE_MS") {
            config.settle_delay = parse_millis("MICMODE_SETTLE_MS", &value)?;
        }

        if let Some(value) = lookup("MICMODE_NOTIFIER") {
            config.notifier = enabled(value);
        }

        if let Some(value) = lookup("MICMODE_NOTIFY_EVENT") {
            config.notify_event = value;
        }

        if let Some(value) = lookup("MICMODE_EXTENDED_STATUS") {
            config.extended_status = parse_flag("MICMODE_EXTENDED_STATUS", &value)?;
        }

        let state_file =
            lookup("MICMODE_STATE_FILE").unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        config.state_file = match enabled(state_file) {
            Some(path) => Some(expand_tilde(&path).context("failed to resolve state file path")?),
            None => None,
        };

        Ok(config)
    }
}

fn enabled(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DISABLED) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key} {value:?}, expected milliseconds"))?;
    Ok(Duration::from_millis(ms))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid {key} {value:?}, expected true or false"),
    }
}
