//! Hardware seam for the half-duplex audio peripheral.

use std::time::Duration;

use crate::error::DeviceError;

/// Capture configuration for listening mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureParams {
    /// Sample rate in Hz (e.g. 16000)
    pub sample_rate: u32,
    /// Always 1, the detector works on a mono stream
    pub channels: u32,
    /// Period size in frames
    pub period_frames: usize,
    /// Number of periods in the ring buffer
    pub period_count: u32,
}

/// Playback configuration for alert mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackParams {
    pub sample_rate: u32,
    pub channels: u32,
    /// Period size in frames (0 = let the driver decide)
    pub period_frames: usize,
    /// Software gain applied before writing, fraction of full scale
    pub gain: f32,
}

/// An audio peripheral that can capture or play, but not both at once.
///
/// Implementations may assume the caller releases the current direction
/// before configuring the other one; `ModeController` guarantees it.
pub trait HalfDuplexDevice {
    /// Install the capture path.
    fn configure_capture(&mut self, params: &CaptureParams) -> Result<(), DeviceError>;

    /// Install the playback path.
    fn configure_playback(&mut self, params: &PlaybackParams) -> Result<(), DeviceError>;

    /// Stop the output stream and free its buffers.
    fn stop_output(&mut self);

    /// Sample rate the installed playback path actually runs at, which may
    /// differ from the requested one. `None` while playback is not installed.
    fn playback_rate(&self) -> Option<u32>;

    /// Uninstall whatever driver is currently installed.
    fn release(&mut self) -> Result<(), DeviceError>;

    /// Read up to `buf.len()` bytes of S16LE mono samples, waiting at most
    /// `timeout`. Returns the number of bytes read; 0 means nothing arrived.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DeviceError>;

    /// Write mono samples, returns the number of samples written.
    fn write(&mut self, pcm: &[i16]) -> Result<usize, DeviceError>;
}

/// Destination of decoded alert audio.
pub trait PcmSink {
    fn write_pcm(&mut self, pcm: &[i16]) -> Result<usize, DeviceError>;
}
