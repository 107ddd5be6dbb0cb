//! Thingstream Click driver library.
//!
//! Turns the modem's line-oriented serial output into a request/response
//! interface: write an AT command, classify each line that comes back, retry
//! on silence, and queue the unsolicited message notifications met along the
//! way.
//!
//! # Modules
//!
//! - `port`: the `LineSource` seam, serial framing and test doubles
//! - `protocol`: command catalog and response classifier
//! - `driver`: command executor, modem operations and the GNSS workflow
//! - `notifications`: queue of received messages
//! - `simulator`: stateful in-memory modem
//! - `config`: TOML configuration with environment overrides
//! - `error`: diagnostic and application errors
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use thingstream_click::{ModemSimulator, ThingstreamClick};
//!
//! let mut click = ThingstreamClick::new(ModemSimulator::new());
//! assert!(click.init());
//! assert!(click.create());
//! assert!(!click.create());
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod port;
pub mod protocol;
pub mod simulator;

pub use driver::{ThingstreamClick, DEFAULT_MAX_RETRIES};
pub use error::{AppError, CommandError};
pub use notifications::NotificationQueue;
pub use port::{
    LineSource, MockSerialPort, PortConfiguration, PortError, ScriptedLineSource,
    SerialLineSource, SerialPortAdapter, SyncSerialPort,
};
pub use protocol::{classify, AsyncEvent, Command, Outcome};
pub use simulator::{ModemSimulator, SessionState};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
