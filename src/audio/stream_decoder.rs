//! Generic clip decoder trait for multi-format alert playback.

use std::path::Path;

use anyhow::Result;

use crate::error::PlaybackError;

/// A decoder that turns an encoded clip into mono i16 PCM at the playback
/// rate, one frame at a time.
///
/// Implementations handle format-specific decoding, resampling, and
/// channel conversion internally.
pub trait ClipDecoder {
    /// Decode the next frame. `Ok(None)` means the clip has ended.
    fn next_frame(&mut self) -> Result<Option<Vec<i16>>>;
}

/// Opens the alert asset and hands back a ready decoder.
pub trait ClipSource {
    /// `output_rate` is the rate the playback hardware actually granted.
    fn open(&self, path: &Path, output_rate: u32) -> Result<Box<dyn ClipDecoder>, PlaybackError>;
}
