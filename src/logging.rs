//! Tracing subscriber setup for the command-line tool.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install a global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Scope the configured level to this crate so dependencies stay quiet.
fn filter_directive(level: &str) -> String {
    format!("warn,thingstream_click={}", level.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(" DEBUG"), "warn,thingstream_click=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}
