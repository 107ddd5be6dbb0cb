//! Transport-level error types.
//!
//! Kept separate from the driver's diagnostics so a line source can fail
//! without the command layer having to know which transport is underneath.

use thiserror::Error;

/// Errors raised by serial adapters and line sources.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The line source has not been initialised (or was deinitialised).
    #[error("Port is not open")]
    NotOpen,

    /// A scripted transport received a write it was not told to expect.
    #[error("Unexpected write: expected {expected:?}, got {actual:?}")]
    Unexpected { expected: String, actual: String },

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True when the error only means "nothing arrived in time".
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyACM0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyACM0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

        let err = PortError::NotOpen;
        assert_eq!(err.to_string(), "Port is not open");
    }

    #[test]
    fn test_timeout_classification() {
        assert!(PortError::timeout(std::time::Duration::from_millis(500)).is_timeout());
        assert!(PortError::Io(std::io::Error::from(std::io::ErrorKind::WouldBlock)).is_timeout());
        assert!(PortError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut)).is_timeout());
        assert!(!PortError::NotOpen.is_timeout());
        assert!(!PortError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).is_timeout());
    }

    #[test]
    fn test_timeout_display_contains_duration() {
        let err = PortError::timeout(std::time::Duration::from_millis(500));
        assert!(err.to_string().contains("500ms"));
    }
}
