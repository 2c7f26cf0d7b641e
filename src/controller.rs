use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{
    ClipSource, HalfDuplexDevice, LevelEstimator, PlaybackSession, PlaybackStatus,
};
use crate::config::Config;
use crate::mode_controller::ModeController;
use crate::state_machine::{LoopState, PeripheralMode};
use crate::status_led::{Status, StatusIndicator};
use crate::trigger::TriggerDebouncer;

/// Runtime knobs of the control loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub threshold: i32,
    pub consecutive: u32,
    pub bias_alpha: f32,
    pub bias_clamp: i32,
    pub block_bytes: usize,
    pub read_timeout: Duration,
    pub asset: PathBuf,
    pub cooldown: Duration,
    pub startup_delay: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.threshold,
            consecutive: config.consecutive,
            bias_alpha: config.bias_alpha,
            bias_clamp: config.bias_clamp,
            block_bytes: config.block_bytes,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            asset: PathBuf::from(config.alert_asset),
            cooldown: Duration::from_millis(config.cooldown_ms),
            startup_delay: Duration::from_millis(config.startup_delay_ms),
        }
    }
}

/// Blocking pause used for the startup delay and the post-alert cooldown.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps in short slices and returns early once shutdown is requested.
pub struct ShutdownAwareSleeper {
    running: Arc<AtomicBool>,
}

impl ShutdownAwareSleeper {
    const SLICE: Duration = Duration::from_millis(100);

    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }
}

impl Sleeper for ShutdownAwareSleeper {
    fn sleep(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(Self::SLICE));
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Peripheral not ready or nothing read this tick.
    NoData,
    /// A reading that did not complete a trigger.
    Quiet { reading: i32 },
    /// Trigger fired, alert clip started.
    Triggered,
    /// Trigger fired but the alert could not be played; back to listening.
    PlaybackFailed,
    /// Alert clip still playing.
    Playing,
    /// Alert clip done, cooldown served, back to listening.
    Finished,
}

/// The listen → alert → cooldown → listen loop.
pub struct ControlLoop<D: HalfDuplexDevice> {
    settings: LoopSettings,
    estimator: LevelEstimator,
    debouncer: TriggerDebouncer,
    modes: ModeController<D>,
    clips: Box<dyn ClipSource>,
    indicator: Box<dyn StatusIndicator>,
    sleeper: Box<dyn Sleeper>,
    state: LoopState,
    block: Vec<u8>,
}

impl<D: HalfDuplexDevice> ControlLoop<D> {
    pub fn new(
        settings: LoopSettings,
        modes: ModeController<D>,
        clips: Box<dyn ClipSource>,
        indicator: Box<dyn StatusIndicator>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        let estimator =
            LevelEstimator::new(settings.block_bytes / 2, settings.bias_alpha, settings.bias_clamp);
        let debouncer = TriggerDebouncer::new(settings.consecutive);
        let block = vec![0u8; settings.block_bytes];
        Self {
            settings,
            estimator,
            debouncer,
            modes,
            clips,
            indicator,
            sleeper,
            state: LoopState::Listening,
            block,
        }
    }

    /// One-time setup: capture mode, green LED, then let the microphone settle.
    pub fn setup(&mut self) {
        if let Err(e) = self.modes.ensure_mode(PeripheralMode::Listening) {
            log::error!("Initial capture setup failed, retrying on first tick: {}", e);
        }
        self.indicator.show(Status::Listening);
        self.sleeper.sleep(self.settings.startup_delay);
        log::info!(
            "Listening: threshold={}, consecutive={}, asset={}",
            self.settings.threshold,
            self.settings.consecutive,
            self.settings.asset.display()
        );
    }

    pub fn tick(&mut self) -> TickEvent {
        if self.state.is_alerting() {
            self.tick_alerting()
        } else {
            self.tick_listening()
        }
    }

    /// Tick until `running` is cleared, then release the hardware.
    pub fn run(&mut self, running: &AtomicBool) {
        self.setup();
        while running.load(Ordering::Relaxed) {
            self.tick();
        }
        self.shutdown();
    }

    pub fn shutdown(&mut self) {
        if let LoopState::Alerting(session) = std::mem::replace(&mut self.state, LoopState::Listening) {
            session.stop();
        }
        if let Err(e) = self.modes.ensure_mode(PeripheralMode::Uninitialized) {
            log::warn!("Failed to release peripheral on shutdown: {}", e);
        }
        log::info!("Control loop stopped, peripheral {:?}", self.modes.mode());
    }

    #[cfg(test)]
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    fn tick_listening(&mut self) -> TickEvent {
        // No-op unless a previous reconfigure failed.
        if let Err(e) = self.modes.ensure_mode(PeripheralMode::Listening) {
            log::warn!("Capture not available this tick: {}", e);
            return TickEvent::NoData;
        }

        let read = match self.modes.read(&mut self.block, self.settings.read_timeout) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("Sample read failed: {}", e);
                0
            }
        };
        let measured = self.estimator.accepts(read);
        let reading = self.estimator.update(&self.block[..read]);
        log::trace!("pressure={} bias={} bytes={}", reading, self.estimator.bias(), read);

        // A short block still reads as 0 and breaks a streak.
        if !self.debouncer.observe(reading, self.settings.threshold) {
            return if measured {
                TickEvent::Quiet { reading }
            } else {
                TickEvent::NoData
            };
        }

        log::info!(
            "Pressure {} above {} for {} blocks, playing alert",
            reading,
            self.settings.threshold,
            self.settings.consecutive
        );
        self.indicator.show(Status::Alerting);

        if let Err(e) = self.modes.ensure_mode(PeripheralMode::Playback) {
            log::error!("Cannot switch to playback, alert skipped: {}", e);
            self.finish_alert();
            return TickEvent::PlaybackFailed;
        }
        let output_rate = self.modes.playback_rate();
        match PlaybackSession::start(&self.settings.asset, self.clips.as_ref(), output_rate) {
            Ok(session) => {
                self.state = LoopState::Alerting(session);
                TickEvent::Triggered
            }
            Err(e) => {
                log::error!("Alert playback failed to start: {}", e);
                self.finish_alert();
                TickEvent::PlaybackFailed
            }
        }
    }

    fn tick_alerting(&mut self) -> TickEvent {
        let status = match &mut self.state {
            LoopState::Alerting(session) => session.poll(&mut self.modes),
            LoopState::Listening => PlaybackStatus::Finished,
        };
        if status == PlaybackStatus::Running {
            return TickEvent::Playing;
        }

        if let LoopState::Alerting(session) = std::mem::replace(&mut self.state, LoopState::Listening) {
            log::info!("Alert finished, {} samples played", session.samples_written());
            session.stop();
        }
        self.finish_alert();
        TickEvent::Finished
    }

    /// Back to capture, serve the cooldown, then show listening again.
    fn finish_alert(&mut self) {
        self.state = LoopState::Listening;
        if let Err(e) = self.modes.ensure_mode(PeripheralMode::Listening) {
            log::error!("Failed to restore capture mode, retrying next tick: {}", e);
        }
        self.debouncer.reset();
        // 冷却期间不再重复警告
        self.sleeper.sleep(self.settings.cooldown);
        self.indicator.show(Status::Listening);
    }
}
