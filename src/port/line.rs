//! Line framing over a byte-level serial adapter.
//!
//! [`SerialLineSource`] is the real-transport [`LineSource`]: it opens a
//! serial device on `init`, accumulates bytes until a `\n` arrives and hands
//! back the line without its terminator.

use super::error::PortError;
use super::sync_port::SyncSerialPort;
use super::traits::{LineSource, PortConfiguration, SerialPortAdapter};
use tracing::{debug, warn};

const READ_CHUNK: usize = 256;

/// Line source backed by a serial port.
pub struct SerialLineSource {
    port_name: String,
    config: PortConfiguration,
    port: Option<Box<dyn SerialPortAdapter>>,
    /// Bytes received but not yet returned as a complete line.
    pending: Vec<u8>,
}

impl SerialLineSource {
    /// Create a line source that opens `port_name` on `init`.
    pub fn new(port_name: impl Into<String>, config: PortConfiguration) -> Self {
        Self {
            port_name: port_name.into(),
            config,
            port: None,
            pending: Vec::new(),
        }
    }

    /// Wrap an adapter that is already open, e.g. a [`MockSerialPort`].
    ///
    /// [`MockSerialPort`]: super::MockSerialPort
    pub fn with_adapter(adapter: impl SerialPortAdapter + 'static) -> Self {
        Self {
            port_name: adapter.name().to_string(),
            config: PortConfiguration::default(),
            port: Some(Box::new(adapter)),
            pending: Vec::new(),
        }
    }

    /// Name of the underlying serial device.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Whether the transport is currently open.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

/// Split the first complete, non-blank line off `pending`.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    while let Some(pos) = memchr::memchr(b'\n', pending) {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let line = decode_line(&raw);
        // Modems pad responses with bare "\r\n" separators.
        if !line.is_empty() {
            return Some(line);
        }
    }
    None
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

impl LineSource for SerialLineSource {
    fn init(&mut self) -> Result<(), PortError> {
        self.pending.clear();
        if self.port.is_some() {
            return Ok(());
        }
        let port = SyncSerialPort::open(&self.port_name, &self.config)?;
        debug!(
            "Opened {} at {} baud",
            self.port_name, self.config.baud_rate
        );
        self.port = Some(Box::new(port));
        Ok(())
    }

    fn available(&self) -> usize {
        let queued = self
            .port
            .as_ref()
            .and_then(|port| port.bytes_to_read())
            .unwrap_or(0);
        self.pending.len() + queued
    }

    fn readline(&mut self) -> String {
        if let Some(line) = take_line(&mut self.pending) {
            return line;
        }
        let Some(port) = self.port.as_mut() else {
            return String::new();
        };

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match port.read_bytes(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    if let Some(line) = take_line(&mut self.pending) {
                        return line;
                    }
                }
                Err(e) if e.is_timeout() => break,
                Err(e) => {
                    warn!("Read from {} failed: {}", self.port_name, e);
                    break;
                }
            }
        }

        // Timed out mid-line: hand back what arrived, like a UART readline.
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }

    fn write(&mut self, text: &str) -> Result<usize, PortError> {
        let port = self.port.as_mut().ok_or(PortError::NotOpen)?;
        port.write_bytes(text.as_bytes())
    }

    fn deinit(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed {}", self.port_name);
        }
        self.pending.clear();
    }
}

impl std::fmt::Debug for SerialLineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLineSource")
            .field("port_name", &self.port_name)
            .field("open", &self.is_open())
            .field("pending_bytes", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    #[test]
    fn test_take_line_skips_blank_separators() {
        let mut pending = b"\r\n\r\n+IOTCREATE: SUCCESS\r\nrest".to_vec();
        assert_eq!(take_line(&mut pending).as_deref(), Some("+IOTCREATE: SUCCESS"));
        assert_eq!(pending, b"rest");
        assert_eq!(take_line(&mut pending), None);
    }

    #[test]
    fn test_decode_line_accepts_bare_newline() {
        assert_eq!(decode_line(b"BUSY\n"), "BUSY");
        assert_eq!(decode_line(b"ERROR\r\n"), "ERROR");
    }

    #[test]
    fn test_write_requires_open_port() {
        let mut source = SerialLineSource::new("/dev/null-modem", PortConfiguration::default());
        assert!(matches!(source.write("AT\r\n"), Err(PortError::NotOpen)));
        assert_eq!(source.readline(), "");
    }

    #[test]
    fn test_partial_line_on_timeout_then_deinit() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"+IOTREC");
        let mut source = SerialLineSource::with_adapter(mock);

        assert_eq!(source.readline(), "+IOTREC");
        source.deinit();
        assert!(!source.is_open());
        assert_eq!(source.available(), 0);
    }
}
