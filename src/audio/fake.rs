//! In-memory audio backend for tests.
//!
//! Simulates a single input device whose mute flag can be queried and
//! written, with switches for the failure modes of real hardware.

use std::sync::Mutex;

use super::{AudioBackend, DeviceId, MuteError};

#[derive(Debug)]
struct Inner {
    device: Option<DeviceId>,
    muted: bool,
    fail_queries: bool,
    fail_writes: bool,
    ignore_writes: bool,
    writes: usize,
    resolutions: usize,
}

/// Scriptable [`AudioBackend`] used by unit tests
#[derive(Debug)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
}

impl FakeBackend {
    pub const DEVICE: DeviceId = DeviceId(42);
    /// Status code reported for simulated failures (`kAudioHardwareUnspecifiedError`)
    pub const STATUS: i32 = 2003329396;

    pub fn new(muted: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                device: Some(Self::DEVICE),
                muted,
                fail_queries: false,
                fail_writes: false,
                ignore_writes: false,
                writes: 0,
                resolutions: 0,
            }),
        }
    }

    pub fn muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    /// Change the mute flag behind the daemon's back
    pub fn set_muted(&self, muted: bool) {
        self.inner.lock().unwrap().muted = muted;
    }

    pub fn set_device(&self, device: Option<DeviceId>) {
        self.inner.lock().unwrap().device = device;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.inner.lock().unwrap().fail_queries = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// Accept writes without error but leave the flag unchanged
    pub fn ignore_writes(&self, ignore: bool) {
        self.inner.lock().unwrap().ignore_writes = ignore;
    }

    /// Number of successful write calls
    pub fn writes(&self) -> usize {
        self.inner.lock().unwrap().writes
    }

    /// Number of default-device lookups
    pub fn resolutions(&self) -> usize {
        self.inner.lock().unwrap().resolutions
    }
}

impl AudioBackend for FakeBackend {
    fn default_input_device(&self) -> Result<DeviceId, MuteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.resolutions += 1;
        inner.device.ok_or(MuteError::NoDefaultDevice)
    }

    fn input_muted(&self, device: DeviceId) -> Result<bool, MuteError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_queries {
            return Err(MuteError::QueryFailed {
                device,
                status: Self::STATUS,
            });
        }
        Ok(inner.muted)
    }

    fn set_input_muted(&self, device: DeviceId, muted: bool) -> Result<(), MuteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(MuteError::ToggleFailed {
                device,
                status: Self::STATUS,
            });
        }
        inner.writes += 1;
        if !inner.ignore_writes {
            inner.muted = muted;
        }
        Ok(())
    }
}
