//! Core traits for the transport seam.
//!
//! Two layers live here: [`SerialPortAdapter`] moves raw bytes and is
//! implemented by real and mock serial ports, while [`LineSource`] is what the
//! modem driver consumes: whole text lines, a readiness probe and raw writes.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration parameters for a serial port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Per-read timeout. This is the only bound on a stuck read.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Trait for byte-level serial I/O.
///
/// Abstracts over synchronous serial port operations so that line framing can
/// run against real hardware or an in-memory mock.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Blocks up to the configured timeout. Returns the number of bytes read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the read/write timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Get the current bytes available to read (if supported).
    ///
    /// Returns `None` if the operation is not supported or cannot be determined.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }
}

/// A line-oriented view of the modem link.
///
/// This is the only interface the driver uses to talk to the modem. Exactly
/// one command is in flight at a time, so implementations need no internal
/// synchronisation of their own.
#[cfg_attr(test, mockall::automock)]
pub trait LineSource {
    /// Open and configure the transport.
    fn init(&mut self) -> Result<(), PortError>;

    /// Number of bytes (or lines) ready to be read without blocking.
    fn available(&self) -> usize;

    /// Block up to the transport timeout and return the next line with its
    /// terminator stripped. Returns an empty string when nothing arrived.
    fn readline(&mut self) -> String;

    /// Send raw text. The caller includes the `\r\n` terminator.
    fn write(&mut self, text: &str) -> Result<usize, PortError>;

    /// Release the transport.
    fn deinit(&mut self);
}
