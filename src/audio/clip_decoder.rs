//! File-backed alert clips decoded with symphonia.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::convert::{downmix_to_mono, LinearResampler};
use super::stream_decoder::{ClipDecoder, ClipSource};
use crate::error::PlaybackError;

/// Decodes an MP3 (or WAV) file packet by packet, producing mono PCM at
/// `output_rate`.
pub struct SymphoniaClipDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    output_rate: u32,
    resampler: Option<LinearResampler>,
}

impl SymphoniaClipDecoder {
    pub fn open(path: &Path, extension: &str, output_rate: u32) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open clip '{}'", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("Unrecognized clip format: '{}'", path.display()))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("Clip contains no audio track")?;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Unsupported clip codec")?;

        log::info!(
            "Clip opened: path={}, rate={:?}, channels={:?}",
            path.display(),
            track.codec_params.sample_rate,
            track.codec_params.channels.map(|c| c.count()),
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            output_rate,
            resampler: None,
        })
    }
}

impl ClipDecoder for SymphoniaClipDecoder {
    fn next_frame(&mut self) -> Result<Option<Vec<i16>>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A damaged frame is skipped, the stream may recover.
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("Clip decode error, skipping packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);

            let mono = downmix_to_mono(samples.samples(), spec.channels.count());
            let output_rate = self.output_rate;
            let resampler = self
                .resampler
                .get_or_insert_with(|| LinearResampler::new(spec.rate, output_rate));
            return Ok(Some(resampler.process(&mono)));
        }
    }
}

/// Factory: create a decoder for the configured clip format.
pub fn create_decoder(
    format: &str,
    path: &Path,
    output_rate: u32,
) -> Result<Box<dyn ClipDecoder>> {
    match format {
        "mp3" | "wav" => Ok(Box::new(SymphoniaClipDecoder::open(
            path,
            format,
            output_rate,
        )?)),
        other => anyhow::bail!("Unsupported clip format: {}", other),
    }
}

/// Opens clips from the local filesystem.
pub struct FileClipSource {
    format: String,
}

impl FileClipSource {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
        }
    }
}

impl ClipSource for FileClipSource {
    fn open(&self, path: &Path, output_rate: u32) -> Result<Box<dyn ClipDecoder>, PlaybackError> {
        if !path.is_file() {
            return Err(PlaybackError::AssetMissing(path.to_path_buf()));
        }
        Ok(create_decoder(&self.format, path, output_rate)?)
    }
}
