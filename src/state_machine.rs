use crate::audio::PlaybackSession;

/// Direction the shared audio peripheral is currently configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralMode {
    /// No driver installed (startup and after shutdown).
    Uninitialized,
    /// Capture path active.
    Listening,
    /// Playback path active.
    Playback,
}

/// What the control loop does on the next tick.
///
/// The playback session is owned by the `Alerting` variant, so there is never
/// more than one, and it cannot outlive the alert.
#[derive(Debug)]
pub enum LoopState {
    Listening,
    Alerting(PlaybackSession),
}

impl LoopState {
    pub fn is_alerting(&self) -> bool {
        matches!(self, LoopState::Alerting(_))
    }
}
