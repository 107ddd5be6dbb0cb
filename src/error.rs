//! Error types shared by the driver and the command-line tool.

use crate::config::ConfigError;
use crate::port::PortError;
use thiserror::Error;

/// Why the most recent modem operation failed.
///
/// Operations themselves still return `bool` or a raw line; this is the
/// diagnostic side channel behind [`ThingstreamClick::last_error`].
///
/// [`ThingstreamClick::last_error`]: crate::ThingstreamClick::last_error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No answer within the retry budget.
    #[error("No response after {attempts} read attempt(s)")]
    TransportTimeout { attempts: u32 },

    /// The modem answered with a BUSY line.
    #[error("Modem busy: {0}")]
    ModemBusy(String),

    /// The modem answered with an ERROR line.
    #[error("Modem error: {0}")]
    ModemError(String),

    /// The modem answered, but not with the success line.
    #[error("Expected {expected:?}, received {received:?}")]
    UnexpectedResponse { expected: String, received: String },

    /// The command could not be written.
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] PortError),

    /// The transport did not open or the modem did not identify itself.
    #[error("Modem on {device} did not initialise{}", .cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    InitFailed {
        device: String,
        cause: Option<CommandError>,
    },

    /// A modem operation reported failure.
    #[error("{operation} failed{}", .cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
    OperationFailed {
        operation: &'static str,
        cause: Option<CommandError>,
    },

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
