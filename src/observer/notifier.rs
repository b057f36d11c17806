//! Status-bar notification via an external command
//!
//! The default target is sketchybar:
//! `sketchybar --trigger microphone_status_change MUTED=true`

use std::process::{Command, Stdio};

use tracing::debug;

use super::ObserverError;

/// Event name the status bar plugin subscribes to
pub const DEFAULT_EVENT: &str = "microphone_status_change";

/// One-way notification sink for status changes
pub trait StatusNotifier: Send {
    /// Deliver `event` with `KEY=value` arguments
    fn notify(&self, event: &str, args: &[String]) -> Result<(), ObserverError>;
}

/// Runs `<program> --trigger <event> <args...>` and waits for it to exit
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl StatusNotifier for CommandNotifier {
    fn notify(&self, event: &str, args: &[String]) -> Result<(), ObserverError> {
        let output = Command::new(&self.program)
            .arg("--trigger")
            .arg(event)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ObserverError::NotifierInvocationFailed {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ObserverError::NotifierInvocationFailed {
                program: self.program.clone(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        debug!(program = %self.program, event, ?args, "notifier invoked");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_reported() {
        let notifier = CommandNotifier::new("micmode-test-notifier-that-does-not-exist");
        let err = notifier
            .notify(DEFAULT_EVENT, &["MUTED=true".to_string()])
            .unwrap_err();
        assert!(matches!(err, ObserverError::NotifierInvocationFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_reported() {
        // `false --trigger ...` ignores its arguments and exits 1
        let notifier = CommandNotifier::new("false");
        let err = notifier.notify(DEFAULT_EVENT, &[]).unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_invocation() {
        let notifier = CommandNotifier::new("true");
        assert_eq!(notifier.program(), "true");
        tokio_test::assert_ok!(notifier.notify(DEFAULT_EVENT, &["MUTED=false".to_string()]));
    }
}
