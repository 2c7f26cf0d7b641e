//! One playback of the warning clip, driven one frame per control-loop tick.

use std::fmt;
use std::path::{Path, PathBuf};

use super::device::PcmSink;
use super::stream_decoder::{ClipDecoder, ClipSource};
use crate::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Running,
    Finished,
}

/// Owns the decoder (and through it the open asset) for the duration of one
/// clip. Everything is released when the session is dropped, whichever way
/// the alert ends.
pub struct PlaybackSession {
    path: PathBuf,
    decoder: Box<dyn ClipDecoder>,
    frames: usize,
    samples: usize,
    finished: bool,
}

impl PlaybackSession {
    /// Open the clip for a device running at `output_rate`.
    pub fn start(
        path: &Path,
        clips: &dyn ClipSource,
        output_rate: u32,
    ) -> Result<Self, PlaybackError> {
        let decoder = clips.open(path, output_rate)?;
        log::info!("Playback started: {} at {}Hz", path.display(), output_rate);
        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            frames: 0,
            samples: 0,
            finished: false,
        })
    }

    /// Decode one frame and hand it to `sink`. Never blocks longer than one
    /// frame write.
    pub fn poll(&mut self, sink: &mut dyn PcmSink) -> PlaybackStatus {
        if self.finished {
            return PlaybackStatus::Finished;
        }

        match self.decoder.next_frame() {
            Ok(Some(pcm)) => {
                self.frames += 1;
                if pcm.is_empty() {
                    return PlaybackStatus::Running;
                }
                match sink.write_pcm(&pcm) {
                    Ok(n) => self.samples += n,
                    Err(e) => log::warn!("Playback write failed, frame dropped: {}", e),
                }
                PlaybackStatus::Running
            }
            Ok(None) => {
                self.finished = true;
                PlaybackStatus::Finished
            }
            Err(e) => {
                log::error!("Playback decode error in {}: {}", self.path.display(), e);
                self.finished = true;
                PlaybackStatus::Finished
            }
        }
    }

    /// End the session early or after it finished.
    pub fn stop(self) {
        drop(self);
    }

    pub fn samples_written(&self) -> usize {
        self.samples
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        log::info!(
            "Playback released: {} ({} frames, {} samples)",
            self.path.display(),
            self.frames,
            self.samples
        );
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("path", &self.path)
            .field("frames", &self.frames)
            .field("finished", &self.finished)
            .finish()
    }
}
