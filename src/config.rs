#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 音频配置
    pub capture_device: &'static str,
    pub playback_device: &'static str,
    pub sample_rate: u32,
    pub block_bytes: usize,
    pub period_frames: usize,
    pub period_count: u32,
    pub read_timeout_ms: u64,
    pub playback_sample_rate: u32,
    pub playback_period_frames: usize,
    pub output_gain: f32,

    // 检测参数
    pub threshold: i32,
    pub consecutive: u32,
    pub bias_alpha: f32,
    pub bias_clamp: i32,

    // 警告音
    pub alert_asset: &'static str,
    pub alert_format: &'static str,
    pub cooldown_ms: u64,
    pub startup_delay_ms: u64,

    // 状态灯（空字符串表示不使用）
    pub led_red: &'static str,
    pub led_green: &'static str,
    pub led_blue: &'static str,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        let config = Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            capture_device: env!("CAPTURE_DEVICE"),
            playback_device: env!("PLAYBACK_DEVICE"),
            sample_rate: env!("SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse SAMPLE_RATE")?,
            block_bytes: env!("BLOCK_BYTES").parse()
                .map_err(|_| "Failed to parse BLOCK_BYTES")?,
            period_frames: env!("PERIOD_FRAMES").parse()
                .map_err(|_| "Failed to parse PERIOD_FRAMES")?,
            period_count: env!("PERIOD_COUNT").parse()
                .map_err(|_| "Failed to parse PERIOD_COUNT")?,
            read_timeout_ms: env!("READ_TIMEOUT_MS").parse()
                .map_err(|_| "Failed to parse READ_TIMEOUT_MS")?,
            playback_sample_rate: env!("PLAYBACK_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse PLAYBACK_SAMPLE_RATE")?,
            playback_period_frames: env!("PLAYBACK_PERIOD_FRAMES").parse()
                .map_err(|_| "Failed to parse PLAYBACK_PERIOD_FRAMES")?,
            output_gain: env!("OUTPUT_GAIN").parse()
                .map_err(|_| "Failed to parse OUTPUT_GAIN")?,

            threshold: env!("DETECTOR_THRESHOLD").parse()
                .map_err(|_| "Failed to parse DETECTOR_THRESHOLD")?,
            consecutive: env!("DETECTOR_CONSECUTIVE").parse()
                .map_err(|_| "Failed to parse DETECTOR_CONSECUTIVE")?,
            bias_alpha: env!("BIAS_ALPHA").parse()
                .map_err(|_| "Failed to parse BIAS_ALPHA")?,
            bias_clamp: env!("BIAS_CLAMP").parse()
                .map_err(|_| "Failed to parse BIAS_CLAMP")?,

            alert_asset: env!("ALERT_ASSET"),
            alert_format: env!("ALERT_FORMAT"),
            cooldown_ms: env!("ALERT_COOLDOWN_MS").parse()
                .map_err(|_| "Failed to parse ALERT_COOLDOWN_MS")?,
            startup_delay_ms: env!("STARTUP_DELAY_MS").parse()
                .map_err(|_| "Failed to parse STARTUP_DELAY_MS")?,

            led_red: env!("LED_RED"),
            led_green: env!("LED_GREEN"),
            led_blue: env!("LED_BLUE"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.block_bytes < 2 || self.block_bytes % 2 != 0 {
            return Err("BLOCK_BYTES must be a positive even number");
        }
        if self.consecutive == 0 {
            return Err("DETECTOR_CONSECUTIVE must be at least 1");
        }
        if !(0.0..1.0).contains(&self.bias_alpha) {
            return Err("BIAS_ALPHA must be in [0, 1)");
        }
        if self.bias_clamp < 0 {
            return Err("BIAS_CLAMP must not be negative");
        }
        if !(0.0..=1.0).contains(&self.output_gain) {
            return Err("OUTPUT_GAIN must be in [0, 1]");
        }
        Ok(())
    }
}
