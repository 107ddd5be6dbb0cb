//! Named modem operations.
//!
//! Each operation builds one command from the catalog, runs it with the
//! driver's retry budget and compares the answer to the command's success
//! line. Every failure collapses to `false` (or an empty or raw line for the
//! read-style operations); [`ThingstreamClick::last_error`] says why.

use super::ThingstreamClick;
use crate::error::CommandError;
use crate::port::LineSource;
use crate::protocol::{debug_mask, Command};
use tracing::warn;

impl<L: LineSource> ThingstreamClick<L> {
    /// Run a command that has a fixed success line.
    fn confirm(&mut self, command: Command<'_>) -> bool {
        let result = self
            .exchange(&command.wire(), self.max_retries)
            .and_then(|line| match command.success_token() {
                Some(token) if line != token => Err(CommandError::UnexpectedResponse {
                    expected: token.to_string(),
                    received: line,
                }),
                _ => Ok(()),
            });
        self.last_error = result.err();
        self.last_error.is_none()
    }

    /// `AT+IOTINFO`: the modem's identification line, returned raw.
    pub fn info(&mut self) -> String {
        self.execute(&Command::Info.wire(), self.max_retries)
    }

    /// `AT+IOTCGNSPWR`: switch the GNSS receiver on or off.
    pub fn gnss_power(&mut self, on: bool) -> bool {
        self.confirm(Command::GnssPower(on))
    }

    /// `AT+IOTCGNSINF`: the raw telemetry line.
    pub fn gnss_info(&mut self) -> String {
        self.execute(&Command::GnssInfo.wire(), self.max_retries)
    }

    /// `AT+IOTCREATE`: create the IoT session.
    pub fn create(&mut self) -> bool {
        self.confirm(Command::Create)
    }

    /// `AT+IOTCONNECT`: connect to the Thingstream platform.
    ///
    /// `drop_messages` requests a clean session. `keep_alive` is accepted but
    /// not sent; the command is the same with or without it.
    pub fn connect(&mut self, drop_messages: bool, keep_alive: Option<u16>) -> bool {
        if let Some(seconds) = keep_alive {
            warn!("keep alive not implemented, ignoring {}s", seconds);
        }
        self.confirm(Command::Connect { drop_messages })
    }

    /// `AT+IOTCONNECT?`
    pub fn is_connected(&mut self) -> bool {
        self.confirm(Command::IsConnected)
    }

    /// `AT+IOTDISCONNECT`
    pub fn disconnect(&mut self) -> bool {
        self.confirm(Command::Disconnect)
    }

    /// `AT+IOTDESTROY`
    pub fn destroy(&mut self) -> bool {
        self.confirm(Command::Destroy)
    }

    /// `AT+IOTPUBLISH`: publish `message` on `topic`.
    ///
    /// Quotes inside `message` are sent as-is. `retain` is accepted but not
    /// sent.
    pub fn publish(&mut self, topic: &str, message: &str, qos: i8, retain: Option<bool>) -> bool {
        if let Some(retain) = retain {
            warn!("retain not implemented, ignoring retain={}", retain);
        }
        self.confirm(Command::Publish {
            topic,
            qos,
            message,
        })
    }

    /// `AT+IOTSUBSCRIBE`
    pub fn subscribe(&mut self, topic: &str, qos: i8) -> bool {
        self.confirm(Command::Subscribe { topic, qos })
    }

    /// `AT+IOTUNSUBSCRIBE`
    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        self.confirm(Command::Unsubscribe { topic })
    }

    /// `AT+IOTREGPRE`: bind a pre-registered topic to a numeric alias.
    pub fn register_alias(&mut self, topic: &str, alias: u32) -> bool {
        self.confirm(Command::RegisterAlias { topic, alias })
    }

    /// `AT+IOTSLEEP`
    pub fn sleep(&mut self, minutes: u32) -> bool {
        self.confirm(Command::Sleep { minutes })
    }

    /// `AT+IOTDEBUG`: route modem debug output to the mikroBUS UART and/or USB.
    pub fn debug_output(&mut self, mikrobus: bool, usb: bool) -> bool {
        self.confirm(Command::Debug {
            mask: debug_mask(mikrobus, usb),
        })
    }

    /// `AT+IOTTEST`
    pub fn self_test(&mut self) -> bool {
        self.confirm(Command::SelfTest)
    }
}
