//! Mock serial port for exercising the line framer without hardware.
//!
//! The mock hands out bytes from an in-memory queue, logs every write and can
//! be told to time out or to deliver data in small chunks so that lines are
//! split across several reads, as they are on a real UART.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockPortState {
    read_queue: VecDeque<u8>,
    write_log: Vec<Vec<u8>>,
    /// Number of upcoming reads that fail with a timeout.
    pending_timeouts: usize,
    /// Upper bound on bytes returned by a single read.
    max_chunk: Option<usize>,
    timeout: Duration,
}

/// In-memory byte-level serial port.
///
/// Clones share state, so a test can keep one handle for inspection while the
/// line source owns another.
///
/// # Example
/// ```
/// use thingstream_click::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_line("+IOTCREATE: SUCCESS");
///
/// let mut buffer = [0u8; 32];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"+IOTCREATE: SUCCESS\r\n");
///
/// port.write_bytes(b"AT+IOTCREATE\r\n").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"AT+IOTCREATE\r\n".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Enqueue raw bytes to be returned by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Enqueue one modem line, appending the `\r\n` terminator.
    pub fn enqueue_line(&mut self, line: &str) {
        let mut state = self.state.lock();
        state.read_queue.extend(line.as_bytes());
        state.read_queue.extend(b"\r\n");
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Make the next `count` reads fail with a timeout.
    pub fn fail_next_reads(&mut self, count: usize) {
        self.state.lock().pending_timeouts = count;
    }

    /// Limit how many bytes a single read may return.
    pub fn set_max_chunk(&mut self, max_chunk: usize) {
        self.state.lock().max_chunk = Some(max_chunk.max(1));
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.state.lock().write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.pending_timeouts > 0 {
            state.pending_timeouts -= 1;
            return Err(PortError::timeout(state.timeout));
        }

        let limit = state.max_chunk.unwrap_or(buffer.len()).min(buffer.len());
        let mut bytes_read = 0;
        for byte in buffer.iter_mut().take(limit) {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // A real port would block until its timeout; the mock reports that at once.
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
