//! audio - Pressure estimation, the half-duplex peripheral, and alert playback
//!
//! Uses ALSA for audio I/O and symphonia for decoding the warning clip.

mod alsa_device;
mod clip_decoder;
mod convert;
pub mod device;
mod level;
mod playback;
pub mod stream_decoder;

pub use alsa_device::AlsaDevice;
pub use clip_decoder::FileClipSource;
pub use convert::apply_gain;
pub use device::{CaptureParams, HalfDuplexDevice, PcmSink, PlaybackParams};
pub use level::LevelEstimator;
pub use playback::{PlaybackSession, PlaybackStatus};
pub use stream_decoder::ClipSource;
