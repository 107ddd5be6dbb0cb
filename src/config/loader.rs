//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "THINGSTREAM";

/// Config file name
const CONFIG_FILE_NAME: &str = "thingstream.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "THINGSTREAM_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `THINGSTREAM_CONFIG` environment variable (explicit path)
    /// 2. `./thingstream.toml` (current directory)
    /// 3. `thingstream.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override any file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform config directory for this tool.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "thingstream-click")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read `THINGSTREAM_<suffix>` and parse it, if set.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern `THINGSTREAM_<SECTION>_<KEY>`,
/// e.g. `THINGSTREAM_SERIAL_PORT=/dev/ttyUSB0`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(port) = env_value::<String>("SERIAL_PORT", "port name")? {
        config.serial.port = port;
    }
    if let Some(baud) = env_value("SERIAL_BAUD", "baud rate")? {
        config.serial.baud = baud;
    }
    if let Some(timeout) = env_value("SERIAL_TIMEOUT_MS", "timeout")? {
        config.serial.timeout_ms = timeout;
    }
    if let Some(retries) = env_value("DRIVER_MAX_RETRIES", "retry count")? {
        config.driver.max_retries = retries;
    }
    if let Some(wait) = env_value("GNSS_WAIT_SECS", "wait time")? {
        config.gnss.wait_secs = wait;
    }
    if let Some(level) = env_value::<String>("LOG_LEVEL", "log level")? {
        config.logging.level = level;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("THINGSTREAM_SERIAL_BAUD", "9600");
        env::set_var("THINGSTREAM_DRIVER_MAX_RETRIES", "8");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.driver.max_retries, 8);

        env::remove_var("THINGSTREAM_SERIAL_BAUD");
        env::remove_var("THINGSTREAM_DRIVER_MAX_RETRIES");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        env::set_var("THINGSTREAM_SERIAL_TIMEOUT_MS", "soon");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "THINGSTREAM_SERIAL_TIMEOUT_MS"));

        env::remove_var("THINGSTREAM_SERIAL_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_load_from_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial]\nport = \"/dev/ttyS4\"\n\n[gnss]\nwait_secs = 30").unwrap();
        env::set_var("THINGSTREAM_GNSS_WAIT_SECS", "12");

        let loader = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(loader.config().serial.port, "/dev/ttyS4");
        assert_eq!(loader.config().gnss.wait_secs, 12);
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));

        env::remove_var("THINGSTREAM_GNSS_WAIT_SECS");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load_from("/nonexistent/thingstream.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial\nport = 1").unwrap();
        let err = ConfigLoader::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
