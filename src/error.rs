//! Error types of the audio peripheral and the alert playback.

use std::path::PathBuf;

use thiserror::Error;

use crate::state_machine::PeripheralMode;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("ALSA error: {0}")]
    Alsa(#[from] alsa::Error),

    #[error("cannot open ALSA {direction} device {device}: {source}")]
    Open {
        device: String,
        direction: &'static str,
        #[source]
        source: alsa::Error,
    },

    #[error("driver error: {0}")]
    Driver(String),

    #[error("peripheral is in {actual:?} mode, {expected:?} required")]
    WrongMode {
        expected: PeripheralMode,
        actual: PeripheralMode,
    },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("alert asset not found: {}", .0.display())]
    AssetMissing(PathBuf),

    #[error("cannot decode alert asset: {0}")]
    Decoder(#[from] anyhow::Error),
}
