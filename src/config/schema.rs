//! Configuration schema definitions.
//!
//! Every section has serde defaults so a partial file, or no file at all,
//! yields a usable configuration.

use super::error::{ConfigError, ConfigResult};
use crate::driver::DEFAULT_MAX_RETRIES;
use crate::port::PortConfiguration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link to the modem
    pub serial: SerialConfig,
    /// Command execution settings
    pub driver: DriverConfig,
    /// GNSS fix workflow defaults
    pub gnss: GnssConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that can never work.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::validation("serial.port", "must not be empty"));
        }
        if self.serial.baud == 0 {
            return Err(ConfigError::validation("serial.baud", "must be greater than 0"));
        }
        if self.serial.timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.driver.notification_capacity == Some(0) {
            return Err(ConfigError::validation(
                "driver.notification_capacity",
                "must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Serial link configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. "/dev/ttyACM0" or "COM3"
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// Per-read timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud: 115_200,
            timeout_ms: 2000,
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Port parameters for opening the device (8N1, no flow control).
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud,
            timeout: self.timeout(),
            ..PortConfiguration::default()
        }
    }
}

/// Command execution section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Extra read attempts per command after a timeout or notification
    pub max_retries: u32,
    /// Bound on queued notifications; unbounded when absent
    pub notification_capacity: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            notification_capacity: None,
        }
    }
}

/// GNSS workflow section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnssConfig {
    /// Seconds to wait between power-on and the telemetry query
    pub wait_secs: u64,
    /// Switch the receiver off after the query
    pub power_off_after: bool,
}

impl Default for GnssConfig {
    fn default() -> Self {
        Self {
            wait_secs: 5,
            power_off_after: true,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    /// Multi-line, human oriented
    #[default]
    Pretty,
    Compact,
}
