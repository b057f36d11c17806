//! CoreAudio implementation of the audio backend
//!
//! Reads and writes `kAudioDevicePropertyMute` on the input scope of the
//! system default input device.

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use objc2_core_audio::{
    kAudioDevicePropertyMute, kAudioDevicePropertyScopeInput,
    kAudioHardwarePropertyDefaultInputDevice, kAudioObjectPropertyElementMain,
    kAudioObjectPropertyScopeGlobal, kAudioObjectSystemObject, kAudioObjectUnknown,
    AudioObjectGetPropertyData, AudioObjectID, AudioObjectPropertyAddress,
    AudioObjectSetPropertyData,
};
use tracing::{debug, error};

use super::{AudioBackend, DeviceId, MuteError};

/// Input mute control through the CoreAudio HAL
#[derive(Debug, Default)]
pub struct CoreAudioBackend;

impl CoreAudioBackend {
    pub fn new() -> Self {
        Self
    }
}

fn mute_address() -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: kAudioDevicePropertyMute,
        mScope: kAudioDevicePropertyScopeInput,
        mElement: kAudioObjectPropertyElementMain,
    }
}

/// Read a fixed-size property value. Returns the raw `OSStatus` on failure.
fn get_property<T: Copy>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    mut value: T,
) -> Result<T, i32> {
    let mut size = size_of::<T>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            NonNull::from(address),
            0,
            ptr::null(),
            NonNull::from(&mut size),
            NonNull::from(&mut value).cast::<c_void>(),
        )
    };
    if status != 0 {
        return Err(status);
    }
    Ok(value)
}

impl AudioBackend for CoreAudioBackend {
    fn default_input_device(&self) -> Result<DeviceId, MuteError> {
        let address = AudioObjectPropertyAddress {
            mSelector: kAudioHardwarePropertyDefaultInputDevice,
            mScope: kAudioObjectPropertyScopeGlobal,
            mElement: kAudioObjectPropertyElementMain,
        };

        let unknown = kAudioObjectUnknown as AudioObjectID;
        match get_property(kAudioObjectSystemObject as AudioObjectID, &address, unknown) {
            Ok(id) if id != unknown => Ok(DeviceId(id)),
            Ok(_) => {
                error!("no default input device reported");
                Err(MuteError::NoDefaultDevice)
            }
            Err(status) => {
                error!(status, "failed to get default input device");
                Err(MuteError::NoDefaultDevice)
            }
        }
    }

    fn input_muted(&self, device: DeviceId) -> Result<bool, MuteError> {
        let muted = get_property(device.0, &mute_address(), 0u32)
            .map_err(|status| MuteError::QueryFailed { device, status })?;
        debug!(%device, muted, "read input mute property");
        Ok(muted != 0)
    }

    fn set_input_muted(&self, device: DeviceId, muted: bool) -> Result<(), MuteError> {
        let address = mute_address();
        let mut value: u32 = muted.into();
        let status = unsafe {
            AudioObjectSetPropertyData(
                device.0,
                NonNull::from(&address),
                0,
                ptr::null(),
                size_of::<u32>() as u32,
                NonNull::from(&mut value).cast::<c_void>(),
            )
        };
        if status != 0 {
            error!(%device, status, "failed to set input mute property");
            return Err(MuteError::ToggleFailed { device, status });
        }
        Ok(())
    }
}
