//! Test doubles for the peripheral, the clip source and the loop's outputs.
//! Every double appends to a shared journal so tests can assert on ordering.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::audio::stream_decoder::ClipDecoder;
use crate::audio::{CaptureParams, ClipSource, HalfDuplexDevice, PcmSink, PlaybackParams};
use crate::controller::Sleeper;
use crate::error::{DeviceError, PlaybackError};
use crate::status_led::{Status, StatusIndicator};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConfigureCapture,
    ConfigurePlayback,
    StopOutput,
    Release,
    Read,
    Write(usize),
    /// Clip opened for output at the given sample rate.
    ClipOpened(u32),
    ClipReleased,
    Status(Status),
    Sleep(Duration),
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }
}

pub fn capture_params() -> CaptureParams {
    CaptureParams {
        sample_rate: 16000,
        channels: 1,
        period_frames: 60,
        period_count: 6,
    }
}

pub fn playback_params() -> PlaybackParams {
    PlaybackParams {
        sample_rate: 16000,
        channels: 1,
        period_frames: 1024,
        gain: 0.8,
    }
}

/// A full 512-sample block of low-level noise.
pub fn quiet_block() -> Vec<i16> {
    (0..512).map(|i| if i % 2 == 0 { 120 } else { -80 }).collect()
}

/// A full 512-sample block with one sharp peak.
pub fn loud_block() -> Vec<i16> {
    let mut block = vec![0i16; 512];
    block[100] = 30000;
    block
}

/// Half-duplex device that tracks which path is active and serves queued
/// sample blocks. An empty queue behaves like a read timeout.
pub struct FakeDevice {
    journal: Journal,
    pub blocks: VecDeque<Vec<i16>>,
    pub input_active: bool,
    pub output_active: bool,
    pub written: Vec<i16>,
    pub fail_release: bool,
    /// Number of upcoming configure calls that fail.
    pub fail_configure: u32,
    /// Playback rate the fake hardware grants; the requested one when `None`.
    pub granted_rate: Option<u32>,
    playback_rate: Option<u32>,
}

impl FakeDevice {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            blocks: VecDeque::new(),
            input_active: false,
            output_active: false,
            written: Vec::new(),
            fail_release: false,
            fail_configure: 0,
            granted_rate: None,
            playback_rate: None,
        }
    }

    fn configure(&mut self) -> Result<(), DeviceError> {
        assert!(
            !self.input_active && !self.output_active,
            "configured while a path is still installed"
        );
        if self.fail_configure > 0 {
            self.fail_configure -= 1;
            return Err(DeviceError::Driver("install failed".into()));
        }
        Ok(())
    }
}

impl HalfDuplexDevice for FakeDevice {
    fn configure_capture(&mut self, _params: &CaptureParams) -> Result<(), DeviceError> {
        self.configure()?;
        self.journal.push(Event::ConfigureCapture);
        self.input_active = true;
        Ok(())
    }

    fn configure_playback(&mut self, params: &PlaybackParams) -> Result<(), DeviceError> {
        self.configure()?;
        self.journal.push(Event::ConfigurePlayback);
        self.output_active = true;
        self.playback_rate = Some(self.granted_rate.unwrap_or(params.sample_rate));
        Ok(())
    }

    fn playback_rate(&self) -> Option<u32> {
        self.playback_rate
    }

    fn stop_output(&mut self) {
        self.journal.push(Event::StopOutput);
        self.output_active = false;
    }

    fn release(&mut self) -> Result<(), DeviceError> {
        self.journal.push(Event::Release);
        self.input_active = false;
        self.output_active = false;
        self.playback_rate = None;
        if self.fail_release {
            return Err(DeviceError::Driver("uninstall failed".into()));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, DeviceError> {
        assert!(self.input_active, "read without capture path");
        self.journal.push(Event::Read);
        let Some(block) = self.blocks.pop_front() else {
            return Ok(0);
        };
        let bytes: Vec<u8> = block.iter().flat_map(|s| s.to_le_bytes()).collect();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn write(&mut self, pcm: &[i16]) -> Result<usize, DeviceError> {
        assert!(self.output_active, "write without playback path");
        self.journal.push(Event::Write(pcm.len()));
        self.written.extend_from_slice(pcm);
        Ok(pcm.len())
    }
}

/// Clip source producing `frames` constant frames, or failing to open.
pub struct FakeClips {
    journal: Journal,
    frames: usize,
    frame_len: usize,
    missing: bool,
    fail_after: Option<usize>,
}

impl FakeClips {
    pub fn new(journal: Journal, frames: usize, frame_len: usize) -> Self {
        Self {
            journal,
            frames,
            frame_len,
            missing: false,
            fail_after: None,
        }
    }

    pub fn missing(journal: Journal) -> Self {
        Self {
            missing: true,
            ..Self::new(journal, 0, 0)
        }
    }

    /// Decoding fails once `frames` frames have been produced.
    pub fn failing_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

impl ClipSource for FakeClips {
    fn open(&self, path: &Path, output_rate: u32) -> Result<Box<dyn ClipDecoder>, PlaybackError> {
        if self.missing {
            return Err(PlaybackError::AssetMissing(path.to_path_buf()));
        }
        self.journal.push(Event::ClipOpened(output_rate));
        Ok(Box::new(FakeClip {
            journal: self.journal.clone(),
            remaining: self.frames,
            frame_len: self.frame_len,
            emitted: 0,
            fail_after: self.fail_after,
        }))
    }
}

struct FakeClip {
    journal: Journal,
    remaining: usize,
    frame_len: usize,
    emitted: usize,
    fail_after: Option<usize>,
}

impl ClipDecoder for FakeClip {
    fn next_frame(&mut self) -> anyhow::Result<Option<Vec<i16>>> {
        if self.fail_after == Some(self.emitted) {
            anyhow::bail!("corrupt frame");
        }
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.emitted += 1;
        Ok(Some(vec![1000; self.frame_len]))
    }
}

impl Drop for FakeClip {
    fn drop(&mut self) {
        self.journal.push(Event::ClipReleased);
    }
}

#[derive(Default)]
pub struct VecSink {
    pub samples: Vec<i16>,
    fail: bool,
}

impl VecSink {
    pub fn failing() -> Self {
        Self {
            samples: Vec::new(),
            fail: true,
        }
    }
}

impl PcmSink for VecSink {
    fn write_pcm(&mut self, pcm: &[i16]) -> Result<usize, DeviceError> {
        if self.fail {
            return Err(DeviceError::Driver("underrun".into()));
        }
        self.samples.extend_from_slice(pcm);
        Ok(pcm.len())
    }
}

pub struct RecordingIndicator(Journal);

impl RecordingIndicator {
    pub fn new(journal: Journal) -> Self {
        Self(journal)
    }
}

impl StatusIndicator for RecordingIndicator {
    fn show(&mut self, status: Status) {
        self.0.push(Event::Status(status));
    }
}

pub struct RecordingSleeper(Journal);

impl RecordingSleeper {
    pub fn new(journal: Journal) -> Self {
        Self(journal)
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.0.push(Event::Sleep(duration));
    }
}
