use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    audio: Audio,
    detector: Detector,
    alert: Alert,
    status: Status,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Audio {
    capture_device: String,
    playback_device: String,
    sample_rate: u32,
    block_bytes: usize,
    period_frames: usize,
    period_count: u32,
    read_timeout_ms: u64,
    playback_sample_rate: u32,
    playback_period_frames: usize,
    output_gain: f32,
}

#[derive(Deserialize)]
struct Detector {
    threshold: i32,
    consecutive: u32,
    bias_alpha: f32,
    bias_clamp: i32,
}

#[derive(Deserialize)]
struct Alert {
    asset: String,
    format: String,
    cooldown_ms: u64,
    startup_delay_ms: u64,
}

#[derive(Deserialize)]
struct Status {
    led_red: String,
    led_green: String,
    led_blue: String,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 音频配置
    println!("cargo:rustc-env=CAPTURE_DEVICE={}", config.audio.capture_device);
    println!("cargo:rustc-env=PLAYBACK_DEVICE={}", config.audio.playback_device);
    println!("cargo:rustc-env=SAMPLE_RATE={}", config.audio.sample_rate);
    println!("cargo:rustc-env=BLOCK_BYTES={}", config.audio.block_bytes);
    println!("cargo:rustc-env=PERIOD_FRAMES={}", config.audio.period_frames);
    println!("cargo:rustc-env=PERIOD_COUNT={}", config.audio.period_count);
    println!("cargo:rustc-env=READ_TIMEOUT_MS={}", config.audio.read_timeout_ms);
    println!("cargo:rustc-env=PLAYBACK_SAMPLE_RATE={}", config.audio.playback_sample_rate);
    println!("cargo:rustc-env=PLAYBACK_PERIOD_FRAMES={}", config.audio.playback_period_frames);
    println!("cargo:rustc-env=OUTPUT_GAIN={}", config.audio.output_gain);

    // 检测参数
    println!("cargo:rustc-env=DETECTOR_THRESHOLD={}", config.detector.threshold);
    println!("cargo:rustc-env=DETECTOR_CONSECUTIVE={}", config.detector.consecutive);
    println!("cargo:rustc-env=BIAS_ALPHA={}", config.detector.bias_alpha);
    println!("cargo:rustc-env=BIAS_CLAMP={}", config.detector.bias_clamp);

    // 警告音配置
    println!("cargo:rustc-env=ALERT_ASSET={}", config.alert.asset);
    println!("cargo:rustc-env=ALERT_FORMAT={}", config.alert.format);
    println!("cargo:rustc-env=ALERT_COOLDOWN_MS={}", config.alert.cooldown_ms);
    println!("cargo:rustc-env=STARTUP_DELAY_MS={}", config.alert.startup_delay_ms);

    // 状态灯
    println!("cargo:rustc-env=LED_RED={}", config.status.led_red);
    println!("cargo:rustc-env=LED_GREEN={}", config.status.led_green);
    println!("cargo:rustc-env=LED_BLUE={}", config.status.led_blue);
}
