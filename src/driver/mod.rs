//! The modem driver: command execution and notification capture.
//!
//! [`ThingstreamClick`] writes one command at a time to its [`LineSource`],
//! reads lines back until one of them answers the command, and routes any
//! notifications it meets on the way into its [`NotificationQueue`]. The
//! named modem operations live in [`session`] and the GNSS workflow in
//! [`gnss`].

pub mod gnss;
pub mod session;

use crate::config::DriverConfig;
use crate::error::CommandError;
use crate::notifications::NotificationQueue;
use crate::port::LineSource;
use crate::protocol::{classify, AsyncEvent, Outcome};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Read attempts allowed per command beyond the first, when not configured.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

type Delay = Box<dyn FnMut(Duration) + Send>;

/// Driver for a Thingstream Click modem attached to a [`LineSource`].
///
/// The driver caches no modem session state: every operation's result is
/// derived from the line the modem sends back.
pub struct ThingstreamClick<L> {
    source: L,
    notifications: NotificationQueue,
    disconnect_notified: bool,
    max_retries: u32,
    last_error: Option<CommandError>,
    delay: Delay,
}

impl<L: LineSource> ThingstreamClick<L> {
    pub fn new(source: L) -> Self {
        Self {
            source,
            notifications: NotificationQueue::new(),
            disconnect_notified: false,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            delay: Box::new(std::thread::sleep),
        }
    }

    /// Build a driver with retry budget and queue bound taken from configuration.
    pub fn from_config(source: L, config: &DriverConfig) -> Self {
        let notifications = match config.notification_capacity {
            Some(capacity) => NotificationQueue::bounded(capacity),
            None => NotificationQueue::new(),
        };
        Self::new(source)
            .with_max_retries(config.max_retries)
            .with_notifications(notifications)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Use an existing queue, e.g. one whose handle a consumer thread already holds.
    pub fn with_notifications(mut self, notifications: NotificationQueue) -> Self {
        self.notifications = notifications;
        self
    }

    /// Replace the blocking delay used while waiting for a GNSS fix.
    pub fn with_delay(mut self, delay: impl FnMut(Duration) + Send + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// Open the transport and ask the modem to identify itself.
    ///
    /// Returns true only if the transport opened and the info answer was
    /// non-empty.
    pub fn init(&mut self) -> bool {
        if let Err(e) = self.source.init() {
            warn!("Transport init failed: {}", e);
            self.last_error = Some(CommandError::Transport(e.to_string()));
            return false;
        }
        let info_line = self.info();
        if info_line.is_empty() {
            return false;
        }
        info!("Modem info: {}", info_line);
        true
    }

    /// Release the transport.
    pub fn deinit(&mut self) {
        self.source.deinit();
    }

    /// Write `command` verbatim and return the line that answered it.
    ///
    /// A payload, BUSY or ERROR line ends the wait at once. Timeouts and
    /// notifications each use up one retry; once more than `max_retries` have
    /// been used the result is an empty string.
    pub fn execute(&mut self, command: &str, max_retries: u32) -> String {
        let result = self.exchange(command, max_retries);
        self.last_error = result.as_ref().err().cloned();
        match result {
            Ok(line) => line,
            Err(CommandError::ModemBusy(line) | CommandError::ModemError(line)) => line,
            Err(_) => String::new(),
        }
    }

    /// Like [`execute`](Self::execute) but keeps the failure category.
    pub(crate) fn exchange(
        &mut self,
        command: &str,
        max_retries: u32,
    ) -> Result<String, CommandError> {
        debug!("send to uart {:?}", command);
        if let Err(e) = self.source.write(command) {
            warn!("Writing {:?} failed: {}", command, e);
            return Err(CommandError::Transport(e.to_string()));
        }

        let mut retries = 0u32;
        let result = loop {
            match self.read_outcome() {
                Outcome::Payload(line) => break Ok(line),
                Outcome::Busy(line) => break Err(CommandError::ModemBusy(line)),
                Outcome::ErrorResponse(line) => break Err(CommandError::ModemError(line)),
                Outcome::Timeout | Outcome::Async(_) => {
                    retries += 1;
                    if retries > max_retries {
                        break Err(CommandError::TransportTimeout { attempts: retries });
                    }
                }
            }
        };

        if let Err(e) = &result {
            debug!("command {:?} not successful: {}", command.trim_end(), e);
        }
        result
    }

    /// Read one line outside of any command, but only if data is waiting.
    ///
    /// Lets notifications be captured while no command is in flight.
    pub fn poll(&mut self) -> Option<Outcome> {
        if self.source.available() > 0 {
            Some(self.read_outcome())
        } else {
            None
        }
    }

    fn read_outcome(&mut self) -> Outcome {
        let line = self.source.readline();
        let outcome = classify(&line);
        trace!("received line {:?} ({})", line, outcome.tag());
        self.absorb(&outcome);
        outcome
    }

    fn absorb(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Async(AsyncEvent::Received(line)) => self.notifications.push(line.clone()),
            Outcome::Async(AsyncEvent::ServerDisconnect) => {
                info!("Server closed the session");
                self.disconnect_notified = true;
            }
            _ => {}
        }
    }

    /// True iff at least one received message is queued.
    pub fn has_message(&self) -> bool {
        self.notifications.has_message()
    }

    /// Oldest queued `+IOTRECEIVE:` line, or an empty string.
    pub fn take_message(&mut self) -> String {
        self.notifications.take_message()
    }

    pub fn pending_messages(&self) -> usize {
        self.notifications.len()
    }

    /// A handle onto the notification queue that can be moved to another thread.
    pub fn notifications(&self) -> NotificationQueue {
        self.notifications.clone()
    }

    /// Whether a `+IOTSERVERDISCONNECT: OK` has been seen.
    pub fn server_disconnected(&self) -> bool {
        self.disconnect_notified
    }

    /// Clear the server-disconnect flag.
    pub fn acknowledge_disconnect(&mut self) {
        self.disconnect_notified = false;
    }

    /// Why the most recent operation failed, if it did.
    pub fn last_error(&self) -> Option<&CommandError> {
        self.last_error.as_ref()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn source(&self) -> &L {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut L {
        &mut self.source
    }

    pub fn into_source(self) -> L {
        self.source
    }
}

impl<L: std::fmt::Debug> std::fmt::Debug for ThingstreamClick<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThingstreamClick")
            .field("source", &self.source)
            .field("pending_messages", &self.notifications.len())
            .field("disconnect_notified", &self.disconnect_notified)
            .field("max_retries", &self.max_retries)
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockLineSource, PortError};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn replying(lines: &'static [&'static str]) -> MockLineSource {
        let mut mock = MockLineSource::new();
        mock.expect_write().times(1).returning(|text| Ok(text.len()));
        let mut seq = Sequence::new();
        for line in lines {
            mock.expect_readline()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || line.to_string());
        }
        mock
    }

    #[test]
    fn test_payload_ends_loop_after_one_read() {
        let mut driver = ThingstreamClick::new(replying(&["+IOTCREATE: SUCCESS"]));
        assert_eq!(driver.execute("AT+IOTCREATE\r\n", 5), "+IOTCREATE: SUCCESS");
        assert_eq!(driver.last_error(), None);
    }

    #[test]
    fn test_busy_is_not_retried() {
        let mut driver = ThingstreamClick::new(replying(&["BUSY"]));
        assert_eq!(driver.execute("AT+IOTCREATE\r\n", 5), "BUSY");
        assert_eq!(
            driver.last_error(),
            Some(&CommandError::ModemBusy("BUSY".into()))
        );
    }

    #[test]
    fn test_error_is_not_retried() {
        let mut driver = ThingstreamClick::new(replying(&["", "ERROR"]));
        assert_eq!(driver.execute("AT+IOTCREATE\r\n", 5), "ERROR");
        assert_eq!(
            driver.last_error(),
            Some(&CommandError::ModemError("ERROR".into()))
        );
    }

    #[test]
    fn test_budget_counts_timeouts_and_notifications() {
        // max_retries = 2 allows three non-answers before giving up.
        let mut driver = ThingstreamClick::new(replying(&[
            "",
            "+IOTRECEIVE: a",
            "+IOTSERVERDISCONNECT: OK",
        ]));
        assert_eq!(driver.execute("AT+IOTINFO\r\n", 2), "");
        assert_eq!(
            driver.last_error(),
            Some(&CommandError::TransportTimeout { attempts: 3 })
        );
        assert_eq!(driver.take_message(), "+IOTRECEIVE: a");
        assert!(driver.server_disconnected());
    }

    #[test]
    fn test_zero_budget_reads_once() {
        let mut driver = ThingstreamClick::new(replying(&[""]));
        assert_eq!(driver.execute("AT+IOTINFO\r\n", 0), "");
    }

    #[test]
    fn test_write_failure_skips_reading() {
        let mut mock = MockLineSource::new();
        mock.expect_write()
            .times(1)
            .returning(|_| Err(PortError::NotOpen));
        mock.expect_readline().never();

        let mut driver = ThingstreamClick::new(mock);
        assert_eq!(driver.execute("AT+IOTINFO\r\n", 5), "");
        assert!(matches!(
            driver.last_error(),
            Some(CommandError::Transport(_))
        ));
    }

    #[test]
    fn test_poll_reads_only_when_data_is_waiting() {
        let mut mock = MockLineSource::new();
        let mut seq = Sequence::new();
        mock.expect_available()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(0usize);
        mock.expect_available()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(17usize);
        mock.expect_readline()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| "+IOTRECEIVE: ping".to_string());

        let mut driver = ThingstreamClick::new(mock);
        assert_eq!(driver.poll(), None);
        assert!(matches!(driver.poll(), Some(Outcome::Async(_))));
        assert!(driver.has_message());
    }

    #[test]
    fn test_init_fails_when_transport_fails() {
        let mut mock = MockLineSource::new();
        mock.expect_init()
            .times(1)
            .returning(|| Err(PortError::not_found("/dev/ttyACM9")));
        mock.expect_write().never();

        let mut driver = ThingstreamClick::new(mock);
        assert!(!driver.init());
    }

    #[test]
    fn test_from_config_applies_bounds() {
        let config = DriverConfig {
            max_retries: 2,
            notification_capacity: Some(1),
        };
        let driver = ThingstreamClick::from_config(MockLineSource::new(), &config);
        assert_eq!(driver.max_retries(), 2);

        let queue = driver.notifications();
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.dropped(), 1);
    }
}
