use std::fs;
use std::path::PathBuf;

use crate::config::Config;

/// What the device is doing, as shown on the status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Listening,
    Alerting,
}

impl Status {
    /// LED colour as (red, green, blue).
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Status::Listening => (0, 128, 0),
            Status::Alerting => (128, 0, 0),
        }
    }
}

/// Fire-and-forget status output.
pub trait StatusIndicator {
    fn show(&mut self, status: Status);
}

/// RGB LED driven through the sysfs LED class
/// (`/sys/class/leds/<name>/brightness`, one file per colour).
pub struct SysfsLed {
    red: PathBuf,
    green: PathBuf,
    blue: PathBuf,
}

impl SysfsLed {
    pub fn new(red: impl Into<PathBuf>, green: impl Into<PathBuf>, blue: impl Into<PathBuf>) -> Self {
        Self {
            red: red.into(),
            green: green.into(),
            blue: blue.into(),
        }
    }
}

impl StatusIndicator for SysfsLed {
    fn show(&mut self, status: Status) {
        let (r, g, b) = status.rgb();
        for (path, value) in [(&self.red, r), (&self.green, g), (&self.blue, b)] {
            if let Err(e) = fs::write(path, value.to_string()) {
                log::debug!("Failed to set LED {}: {}", path.display(), e);
            }
        }
        log::info!("Status: {:?}", status);
    }
}

/// Used when no LED is configured.
pub struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn show(&mut self, status: Status) {
        log::info!("Status: {:?}", status);
    }
}

/// Pick the indicator described by the configuration.
pub fn from_config(config: &Config) -> Box<dyn StatusIndicator> {
    if config.led_red.is_empty() || config.led_green.is_empty() || config.led_blue.is_empty() {
        Box::new(LogIndicator)
    } else {
        Box::new(SysfsLed::new(config.led_red, config.led_green, config.led_blue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysfs_led_writes_brightness() {
        let dir = std::env::temp_dir().join(format!("noise_sentry_led_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut led = SysfsLed::new(dir.join("r"), dir.join("g"), dir.join("b"));

        led.show(Status::Alerting);
        assert_eq!(fs::read_to_string(dir.join("r")).unwrap(), "128");
        assert_eq!(fs::read_to_string(dir.join("g")).unwrap(), "0");

        led.show(Status::Listening);
        assert_eq!(fs::read_to_string(dir.join("r")).unwrap(), "0");
        assert_eq!(fs::read_to_string(dir.join("g")).unwrap(), "128");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_led_is_ignored() {
        let mut led = SysfsLed::new("/nonexistent/r", "/nonexistent/g", "/nonexistent/b");
        led.show(Status::Alerting);
    }
}
