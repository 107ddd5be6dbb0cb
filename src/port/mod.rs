//! Transport layer for the modem link.
//!
//! Provides the [`LineSource`] seam the driver consumes, a serial-backed
//! implementation with line framing, and in-memory doubles for testing.

pub mod error;
pub mod line;
pub mod mock;
pub mod scripted;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use line::SerialLineSource;
pub use mock::MockSerialPort;
pub use scripted::ScriptedLineSource;
pub use sync_port::SyncSerialPort;
pub use traits::*;
