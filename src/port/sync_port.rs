//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialPortAdapter` trait so the line framer can be tested against a mock.

use super::error::PortError;
use super::traits::{PortConfiguration, SerialPortAdapter};
use std::io::{Read, Write};
use std::time::Duration;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Arguments
    /// * `port_name` - The system path to the serial port (e.g., "/dev/ttyACM0" or "COM3")
    /// * `config` - Configuration parameters for the port
    ///
    /// # Example
    /// ```no_run
    /// use thingstream_click::port::{SyncSerialPort, PortConfiguration};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyACM0", &PortConfiguration::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write_all(data).map_err(PortError::Io)?;
        self.port.flush().map_err(PortError::Io)?;
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn bytes_to_read(&self) -> Option<usize> {
        self.port.bytes_to_read().ok().map(|n| n as usize)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}
