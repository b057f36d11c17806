//! Microphone mute control for the default input device
//!
//! The platform layer is reduced to three raw operations behind
//! [`AudioBackend`]. [`MuteController`] builds the read/toggle/verify
//! contract on top of it and re-resolves the default device on every call.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

#[cfg(target_os = "macos")]
mod coreaudio;
#[cfg(test)]
pub mod fake;

#[cfg(target_os = "macos")]
pub use coreaudio::CoreAudioBackend;

/// Opaque handle to an audio device as known by the host audio subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Errors raised by the hardware layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MuteError {
    #[error("no default input device is available")]
    NoDefaultDevice,

    #[error("failed to query mute state of {device} (status {status})")]
    QueryFailed { device: DeviceId, status: i32 },

    #[error("failed to set mute state of {device} (status {status})")]
    ToggleFailed { device: DeviceId, status: i32 },

    #[error("mute state of {device} did not change: wrote {expected}, read back {actual}")]
    VerificationMismatch {
        device: DeviceId,
        expected: bool,
        actual: bool,
    },
}

/// Raw platform operations on input devices.
///
/// Implementations map platform status codes onto [`MuteError`] and must not
/// retry or cache anything.
pub trait AudioBackend: Send + Sync {
    /// The device the OS currently designates as default input
    fn default_input_device(&self) -> Result<DeviceId, MuteError>;

    /// Current mute flag of the device's input scope
    fn input_muted(&self, device: DeviceId) -> Result<bool, MuteError>;

    /// Write the mute flag of the device's input scope
    fn set_input_muted(&self, device: DeviceId, muted: bool) -> Result<(), MuteError>;
}

/// Mute controller for the current default input device.
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct MuteController {
    backend: Arc<dyn AudioBackend>,
    /// Pause between writing the flag and reading it back
    settle_delay: Duration,
}

impl MuteController {
    pub fn new(backend: Arc<dyn AudioBackend>, settle_delay: Duration) -> Self {
        Self {
            backend,
            settle_delay,
        }
    }

    /// Resolve the default input device. Never cached, the default may change
    /// between calls.
    pub fn resolve_target_device(&self) -> Result<DeviceId, MuteError> {
        let device = self.backend.default_input_device()?;
        debug!(%device, "resolved default input device");
        Ok(device)
    }

    pub fn read_mute_state(&self, device: DeviceId) -> Result<bool, MuteError> {
        self.backend.input_muted(device)
    }

    /// Invert the mute flag and verify the write landed.
    ///
    /// Returns the new mute state. A write that returns without error but is
    /// not observed on the read-back fails with
    /// [`MuteError::VerificationMismatch`].
    pub fn toggle_mute_state(&self, device: DeviceId) -> Result<bool, MuteError> {
        let current = self.backend.input_muted(device)?;
        let target = !current;

        self.backend.set_input_muted(device, target)?;

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let actual = self.backend.input_muted(device)?;
        if actual != target {
            warn!(%device, expected = target, actual, "mute write did not land");
            return Err(MuteError::VerificationMismatch {
                device,
                expected: target,
                actual,
            });
        }

        info!(%device, muted = target, "microphone mute toggled");
        Ok(target)
    }

    /// Resolve the default device and read its mute state
    pub fn current_mute_state(&self) -> Result<bool, MuteError> {
        let device = self.resolve_target_device()?;
        self.read_mute_state(device)
    }

    /// Resolve the default device and toggle its mute state
    pub fn toggle(&self) -> Result<bool, MuteError> {
        let device = self.resolve_target_device()?;
        self.toggle_mute_state(device)
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeBackend;
    use super::*;

    fn controller(backend: &Arc<FakeBackend>) -> MuteController {
        MuteController::new(backend.clone(), Duration::ZERO)
    }

    #[test]
    fn test_toggle_inverts_and_verifies() {
        let backend = Arc::new(FakeBackend::new(true));
        let mute = controller(&backend);

        assert_eq!(mute.toggle(), Ok(false));
        assert!(!backend.muted());
        assert_eq!(mute.toggle(), Ok(true));
        assert!(backend.muted());
        assert_eq!(backend.writes(), 2);
    }

    #[test]
    fn test_toggle_detects_write_that_did_not_land() {
        let backend = Arc::new(FakeBackend::new(false));
        backend.ignore_writes(true);
        let mute = controller(&backend);

        let err = mute.toggle().unwrap_err();
        assert_eq!(
            err,
            MuteError::VerificationMismatch {
                device: FakeBackend::DEVICE,
                expected: true,
                actual: false,
            }
        );
        assert!(!backend.muted());
    }

    #[test]
    fn test_missing_default_device() {
        let backend = Arc::new(FakeBackend::new(false));
        backend.set_device(None);
        let mute = controller(&backend);

        assert_eq!(mute.current_mute_state(), Err(MuteError::NoDefaultDevice));
        assert_eq!(mute.toggle(), Err(MuteError::NoDefaultDevice));
    }

    #[test]
    fn test_query_failure_is_not_retried() {
        let backend = Arc::new(FakeBackend::new(false));
        backend.fail_queries(true);
        let mute = controller(&backend);

        assert!(matches!(
            mute.toggle(),
            Err(MuteError::QueryFailed { status: FakeBackend::STATUS, .. })
        ));
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn test_write_failure_maps_to_toggle_failed() {
        let backend = Arc::new(FakeBackend::new(true));
        backend.fail_writes(true);
        let mute = controller(&backend);

        assert!(matches!(mute.toggle(), Err(MuteError::ToggleFailed { .. })));
        assert!(backend.muted());
    }

    #[test]
    fn test_device_is_resolved_on_every_call() {
        let backend = Arc::new(FakeBackend::new(false));
        let mute = controller(&backend);

        mute.current_mute_state().unwrap();
        backend.set_device(Some(DeviceId(7)));
        assert_eq!(mute.resolve_target_device(), Ok(DeviceId(7)));
        mute.toggle().unwrap();
        assert_eq!(backend.resolutions(), 3);
    }
}
