//! ALSA implementation of the half-duplex peripheral.
//!
//! Only one PCM handle is open at any time. Capture and playback may point at
//! the same card, which is why the handle is closed before the other
//! direction is opened.

use std::time::Duration;

use alsa::pcm::{Access, Format, HwParams, State, PCM};
use alsa::{Direction, ValueOr};

use super::device::{CaptureParams, HalfDuplexDevice, PlaybackParams};
use crate::error::DeviceError;
use crate::state_machine::PeripheralMode;

/// Bytes per mono S16LE frame.
const FRAME_BYTES: usize = 2;

/// Max consecutive XRUN recoveries for a single write before giving up on it.
const MAX_WRITE_RECOVERIES: u32 = 3;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Actual number of channels
    pub channels: u32,
    /// Period size in frames
    pub period_size: usize,
}

pub struct AlsaDevice {
    capture_device: String,
    playback_device: String,
    pcm: Option<(PCM, Direction)>,
    /// Rate granted by the hardware for the open playback PCM.
    playback_rate: Option<u32>,
}

impl AlsaDevice {
    pub fn new(capture_device: &str, playback_device: &str) -> Self {
        Self {
            capture_device: capture_device.to_string(),
            playback_device: playback_device.to_string(),
            pcm: None,
            playback_rate: None,
        }
    }

    fn active(&self, direction: Direction) -> Result<&PCM, DeviceError> {
        match &self.pcm {
            Some((pcm, dir)) if *dir == direction => Ok(pcm),
            Some((_, dir)) => Err(DeviceError::WrongMode {
                expected: mode_of(direction),
                actual: mode_of(*dir),
            }),
            None => Err(DeviceError::WrongMode {
                expected: mode_of(direction),
                actual: PeripheralMode::Uninitialized,
            }),
        }
    }

    fn ensure_closed(&self) -> Result<(), DeviceError> {
        if self.pcm.is_some() {
            return Err(DeviceError::Driver(
                "PCM still open, release it before reconfiguring".into(),
            ));
        }
        Ok(())
    }
}

fn mode_of(direction: Direction) -> PeripheralMode {
    match direction {
        Direction::Capture => PeripheralMode::Listening,
        Direction::Playback => PeripheralMode::Playback,
    }
}

impl HalfDuplexDevice for AlsaDevice {
    fn configure_capture(&mut self, params: &CaptureParams) -> Result<(), DeviceError> {
        self.ensure_closed()?;
        let (pcm, _) = open_pcm(
            &self.capture_device,
            Direction::Capture,
            params.sample_rate,
            params.channels,
            Some(params.period_frames),
            Some(params.period_count),
        )?;
        self.pcm = Some((pcm, Direction::Capture));
        Ok(())
    }

    fn configure_playback(&mut self, params: &PlaybackParams) -> Result<(), DeviceError> {
        self.ensure_closed()?;
        let period_size = if params.period_frames > 0 {
            Some(params.period_frames)
        } else {
            None
        };
        let (pcm, negotiated) = open_pcm(
            &self.playback_device,
            Direction::Playback,
            params.sample_rate,
            params.channels,
            period_size,
            None,
        )?;
        self.pcm = Some((pcm, Direction::Playback));
        self.playback_rate = Some(negotiated.sample_rate);
        Ok(())
    }

    fn playback_rate(&self) -> Option<u32> {
        self.playback_rate
    }

    fn stop_output(&mut self) {
        if let Some((pcm, Direction::Playback)) = &self.pcm {
            // Let the tail of the clip play out.
            if let Err(e) = pcm.drain() {
                log::warn!("ALSA playback drain failed: {}", e);
            }
        }
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        // Dropping the handle closes the PCM and stops any running stream.
        self.playback_rate = None;
        if let Some((_pcm, dir)) = self.pcm.take() {
            log::debug!("ALSA {:?} PCM closed", dir);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        let pcm = self.active(Direction::Capture)?;

        // Capture does not start on its own, and wait() never returns on a
        // stream that is only prepared.
        if pcm.state() == State::Prepared
            && recover_capture(pcm.start(), |e| pcm.try_recover(e, true))?.is_none()
        {
            return Ok(0);
        }

        // An overrun surfaces as -EPIPE from wait() as well as from readi().
        let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;
        match recover_capture(pcm.wait(Some(timeout_ms)), |e| pcm.try_recover(e, true))? {
            Some(true) => {}
            Some(false) | None => return Ok(0),
        }

        let usable = buf.len() - buf.len() % FRAME_BYTES;
        let frames = recover_capture(pcm.io_bytes().readi(&mut buf[..usable]), |e| {
            pcm.try_recover(e, true)
        })?;
        Ok(frames.unwrap_or(0) * FRAME_BYTES)
    }

    fn write(&mut self, pcm_data: &[i16]) -> Result<usize, DeviceError> {
        let pcm = self.active(Direction::Playback)?;
        let io = pcm.io_i16()?;

        // Short writes and XRUNs are retried so frames are not lost.
        let mut frames_written = 0;
        let mut retry_count = 0u32;
        while frames_written < pcm_data.len() {
            match io.writei(&pcm_data[frames_written..]) {
                Ok(n) => {
                    frames_written += n;
                    retry_count = 0;
                }
                Err(e) => {
                    log::warn!("ALSA XRUN or error: {}, recovering...", e);
                    retry_count += 1;
                    pcm.prepare()?;

                    if retry_count >= MAX_WRITE_RECOVERIES {
                        log::error!(
                            "Max recovery retries ({}) reached. Dropping {} unwritten frames.",
                            retry_count,
                            pcm_data.len() - frames_written
                        );
                        break;
                    }
                }
            }
        }
        Ok(frames_written)
    }
}

/// Run a capture step; on failure try to bring the stream back (XRUN,
/// suspend) and report `None` so the tick counts as "no data".
fn recover_capture<T>(
    result: alsa::Result<T>,
    recover: impl FnOnce(alsa::Error) -> alsa::Result<()>,
) -> Result<Option<T>, DeviceError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("ALSA capture error: {}, recovering...", e);
            recover(e)?;
            Ok(None)
        }
    }
}

fn open_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    channels: u32,
    period_size: Option<usize>,
    period_count: Option<u32>,
) -> Result<(PCM, AlsaParams), DeviceError> {
    let dir_name = match direction {
        Direction::Capture => "Capture",
        Direction::Playback => "Playback",
    };
    configure_pcm(device, direction, sample_rate, channels, period_size, period_count).map_err(
        |source| DeviceError::Open {
            device: device.to_string(),
            direction: dir_name,
            source,
        },
    )
}

fn configure_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    channels: u32,
    period_size: Option<usize>,
    period_count: Option<u32>,
) -> alsa::Result<(PCM, AlsaParams)> {
    let pcm = PCM::new(device, direction, false)?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm)?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_channels(channels)?;
        hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
        if let Some(ps) = period_size {
            hwp.set_period_size_near(ps as alsa::pcm::Frames, ValueOr::Nearest)?;
        }
        if let Some(count) = period_count {
            hwp.set_periods(count, ValueOr::Nearest)?;
        }
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let params = {
        let hwp = pcm.hw_params_current()?;
        AlsaParams {
            sample_rate: hwp.get_rate()?,
            channels: hwp.get_channels()?,
            period_size: hwp.get_period_size()? as usize,
        }
    };

    log::info!(
        "ALSA {:?}: device={}, rate={}, channels={}, period_size={}",
        direction,
        device,
        params.sample_rate,
        params.channels,
        params.period_size,
    );

    if params.sample_rate != sample_rate {
        log::warn!(
            "ALSA {:?}: requested {}Hz, hardware gave {}Hz",
            direction,
            sample_rate,
            params.sample_rate
        );
    }

    Ok((pcm, params))
}
