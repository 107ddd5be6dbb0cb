//! Configuration for the driver and the command-line tool.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `THINGSTREAM_CONFIG` environment variable (explicit path)
//! 2. `./thingstream.toml` (current directory)
//! 3. `thingstream.toml` in the platform config directory
//!    (e.g. `~/.config/thingstream-click/` on Linux)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `THINGSTREAM_SERIAL_PORT`, `THINGSTREAM_SERIAL_BAUD`, `THINGSTREAM_SERIAL_TIMEOUT_MS`
//! - `THINGSTREAM_DRIVER_MAX_RETRIES`
//! - `THINGSTREAM_GNSS_WAIT_SECS`
//! - `THINGSTREAM_LOG_LEVEL`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! baud = 115200
//! timeout_ms = 2000
//!
//! [driver]
//! max_retries = 5
//! notification_capacity = 256
//!
//! [gnss]
//! wait_secs = 5
//! power_off_after = true
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, DriverConfig, GnssConfig, LogFormat, LoggingConfig, SerialConfig};
