use std::time::Duration;

use crate::audio::{apply_gain, CaptureParams, HalfDuplexDevice, PcmSink, PlaybackParams};
use crate::error::DeviceError;
use crate::state_machine::PeripheralMode;

/// Owns the shared audio peripheral and switches it between capture and
/// playback.
///
/// Switching always tears the old direction down before the new one is
/// configured, and does nothing when the requested mode is already active.
pub struct ModeController<D: HalfDuplexDevice> {
    device: D,
    mode: PeripheralMode,
    capture: CaptureParams,
    playback: PlaybackParams,
}

impl<D: HalfDuplexDevice> ModeController<D> {
    pub fn new(device: D, capture: CaptureParams, playback: PlaybackParams) -> Self {
        Self {
            device,
            mode: PeripheralMode::Uninitialized,
            capture,
            playback,
        }
    }

    pub fn mode(&self) -> PeripheralMode {
        self.mode
    }

    /// Bring the peripheral into `target` mode. Returns whether the hardware
    /// was touched.
    ///
    /// If configuring the new direction fails the mode is left
    /// `Uninitialized`, so the next call tries again.
    pub fn ensure_mode(&mut self, target: PeripheralMode) -> Result<bool, DeviceError> {
        if self.mode == target {
            return Ok(false);
        }
        log::info!("Peripheral mode {:?} -> {:?}", self.mode, target);

        if self.mode == PeripheralMode::Playback {
            self.device.stop_output();
        }
        if self.mode != PeripheralMode::Uninitialized {
            if let Err(e) = self.device.release() {
                // Hardware state is opaque here; carry on and reconfigure anyway.
                log::warn!("Failed to release {:?} driver: {}", self.mode, e);
            }
        }
        self.mode = PeripheralMode::Uninitialized;

        let configured = match target {
            PeripheralMode::Listening => self.device.configure_capture(&self.capture),
            PeripheralMode::Playback => self.device.configure_playback(&self.playback),
            PeripheralMode::Uninitialized => Ok(()),
        };
        if let Err(e) = configured {
            log::error!("Failed to configure {:?} mode: {}", target, e);
            return Err(e);
        }

        self.mode = target;
        Ok(true)
    }

    /// Read one block from the capture path.
    pub fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        self.require(PeripheralMode::Listening)?;
        self.device.read(buf, timeout)
    }

    /// Rate of the installed playback path, falling back to the requested
    /// rate when the device does not report one.
    pub fn playback_rate(&self) -> u32 {
        self.device
            .playback_rate()
            .unwrap_or(self.playback.sample_rate)
    }

    fn require(&self, expected: PeripheralMode) -> Result<(), DeviceError> {
        if self.mode != expected {
            return Err(DeviceError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[cfg(test)]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: HalfDuplexDevice> PcmSink for ModeController<D> {
    fn write_pcm(&mut self, pcm: &[i16]) -> Result<usize, DeviceError> {
        self.require(PeripheralMode::Playback)?;
        let scaled = apply_gain(pcm, self.playback.gain);
        self.device.write(&scaled)
    }
}
