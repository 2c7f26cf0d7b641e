mod audio;
mod config;
mod controller;
mod error;
mod mode_controller;
mod state_machine;
mod status_led;
mod trigger;

#[cfg(test)]
mod testing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use audio::{AlsaDevice, CaptureParams, FileClipSource, PlaybackParams};
use config::Config;
use controller::{ControlLoop, LoopSettings, ShutdownAwareSleeper};
use mode_controller::ModeController;
use tokio::signal;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let config = Config::new().map_err(anyhow::Error::msg)?;
    log::info!("{} {} starting", config.app_name, config.app_version);

    let running = Arc::new(AtomicBool::new(true));
    let (done_tx, done_rx) = oneshot::channel();

    // 控制循环跑在独立线程上，采样读取是阻塞调用
    let handle = {
        let running = running.clone();
        let config = config.clone();
        thread::Builder::new()
            .name("alert-loop".into())
            .spawn(move || {
                run_control_loop(&config, running);
                let _ = done_tx.send(());
            })
            .context("Failed to spawn control loop thread")?
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Received Ctrl+C, shutting down...");
        }
        _ = done_rx => {
            log::warn!("Control loop exited");
        }
    }

    running.store(false, Ordering::SeqCst);
    // 等待控制循环释放音频设备
    tokio::task::spawn_blocking(move || handle.join())
        .await?
        .map_err(|_| anyhow::anyhow!("Control loop thread panicked"))?;
    Ok(())
}

fn run_control_loop(config: &Config, running: Arc<AtomicBool>) {
    let device = AlsaDevice::new(config.capture_device, config.playback_device);
    let capture = CaptureParams {
        sample_rate: config.sample_rate,
        channels: 1,
        period_frames: config.period_frames,
        period_count: config.period_count,
    };
    let playback = PlaybackParams {
        sample_rate: config.playback_sample_rate,
        channels: 1,
        period_frames: config.playback_period_frames,
        gain: config.output_gain,
    };
    let modes = ModeController::new(device, capture, playback);

    let mut control = ControlLoop::new(
        LoopSettings::from_config(config),
        modes,
        Box::new(FileClipSource::new(config.alert_format)),
        status_led::from_config(config),
        Box::new(ShutdownAwareSleeper::new(running.clone())),
    );
    control.run(&running);
}
