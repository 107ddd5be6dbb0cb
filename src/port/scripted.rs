//! Scripted line source for deterministic driver tests.
//!
//! [`ScriptedLineSource`] replays a fixed list of request/response pairs.
//! When the driver writes the next expected command, the scripted response
//! lines become readable. Unsolicited lines can be pushed at any time to
//! model notifications arriving between or during commands.

use super::error::PortError;
use super::traits::LineSource;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Expectation {
    request: String,
    responses: Vec<String>,
}

#[derive(Debug, Default)]
struct ScriptState {
    expectations: VecDeque<Expectation>,
    readable: VecDeque<String>,
    sent_log: Vec<String>,
    reads: usize,
    initialised: bool,
    fail_init: bool,
}

/// A [`LineSource`] driven entirely by a pre-loaded script.
///
/// Expectations are consumed in order. Reads with nothing queued return an
/// empty line immediately, which the driver treats as a timeout. Clones share
/// state so a test can inspect the log after handing a clone to the driver.
///
/// # Example
/// ```
/// use thingstream_click::port::{LineSource, ScriptedLineSource};
///
/// let mut source = ScriptedLineSource::new();
/// source.expect("AT+IOTCREATE\r\n", &["+IOTCREATE: SUCCESS"]);
///
/// source.write("AT+IOTCREATE\r\n").unwrap();
/// assert_eq!(source.readline(), "+IOTCREATE: SUCCESS");
/// assert_eq!(source.readline(), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedLineSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedLineSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected request and the lines the modem answers it with.
    ///
    /// An empty `responses` slice models a modem that never answers.
    pub fn expect(&mut self, request: &str, responses: &[&str]) {
        self.state.lock().expectations.push_back(Expectation {
            request: request.to_string(),
            responses: responses.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// Make a line readable without any preceding write.
    pub fn push_unsolicited(&mut self, line: &str) {
        self.state.lock().readable.push_back(line.to_string());
    }

    /// Make the next `init` call fail.
    pub fn fail_init(&mut self) {
        self.state.lock().fail_init = true;
    }

    /// Every string written so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent_log.clone()
    }

    /// Total number of `readline` calls, including ones that timed out.
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state.lock().expectations.len()
    }

    pub fn is_initialised(&self) -> bool {
        self.state.lock().initialised
    }
}

impl LineSource for ScriptedLineSource {
    fn init(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_init) {
            return Err(PortError::not_found("scripted"));
        }
        state.initialised = true;
        Ok(())
    }

    fn available(&self) -> usize {
        self.state.lock().readable.front().map_or(0, |line| line.len())
    }

    fn readline(&mut self) -> String {
        let mut state = self.state.lock();
        state.reads += 1;
        state.readable.pop_front().unwrap_or_default()
    }

    fn write(&mut self, text: &str) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.sent_log.push(text.to_string());

        match state.expectations.pop_front() {
            Some(expectation) if expectation.request == text => {
                state.readable.extend(expectation.responses);
                Ok(text.len())
            }
            Some(expectation) => Err(PortError::Unexpected {
                expected: expectation.request,
                actual: text.to_string(),
            }),
            None => Err(PortError::Unexpected {
                expected: String::new(),
                actual: text.to_string(),
            }),
        }
    }

    fn deinit(&mut self) {
        self.state.lock().initialised = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_follow_matching_write() {
        let mut source = ScriptedLineSource::new();
        source.expect("AT+IOTINFO\r\n", &["+IOTINFO: A", "+IOTINFO: B"]);

        assert_eq!(source.readline(), "");
        source.write("AT+IOTINFO\r\n").unwrap();
        assert_eq!(source.readline(), "+IOTINFO: A");
        assert_eq!(source.readline(), "+IOTINFO: B");
        assert_eq!(source.reads(), 3);
        assert_eq!(source.remaining_expectations(), 0);
    }

    #[test]
    fn test_unexpected_write_is_rejected() {
        let mut source = ScriptedLineSource::new();
        source.expect("AT+IOTCREATE\r\n", &["+IOTCREATE: SUCCESS"]);

        let err = source.write("AT+IOTDESTROY\r\n").unwrap_err();
        assert!(matches!(err, PortError::Unexpected { .. }));
        assert_eq!(source.available(), 0);
        assert_eq!(source.sent(), vec!["AT+IOTDESTROY\r\n".to_string()]);
    }

    #[test]
    fn test_unsolicited_lines_are_readable() {
        let mut source = ScriptedLineSource::new();
        source.push_unsolicited("+IOTRECEIVE: hi");
        assert!(source.available() > 0);
        assert_eq!(source.readline(), "+IOTRECEIVE: hi");
        assert_eq!(source.available(), 0);
    }

    #[test]
    fn test_fail_init_once() {
        let mut source = ScriptedLineSource::new();
        source.fail_init();
        assert!(source.init().is_err());
        assert!(source.init().is_ok());
        assert!(source.is_initialised());
        source.deinit();
        assert!(!source.is_initialised());
    }
}
