//! In-memory modem simulator.
//!
//! [`ModemSimulator`] is a [`LineSource`] that answers the command catalog the
//! way the reference dummy modem does, tracking whether the IoT session has
//! been created and connected and whether the GNSS receiver is powered. It
//! is used by the conformance tests and by the CLI's `--simulate` mode.

use crate::port::{LineSource, PortError};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Identification line returned for `AT+IOTINFO`.
pub const SIMULATED_INFO: &str = "+IOTINFO: IMSI=123123123 IMEI=123123123 Version=DUMMY";

/// Telemetry line returned for `AT+IOTCGNSINF`.
pub const SIMULATED_FIX: &str = "+IOTCGNSINF: ,1,20190729224430.000,50.7214446,-1.8805652,18.379,1.63,120.5,1,,3.3,3.5,1.0,,7,4,,,35,,";

/// Session state held by the simulated modem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub created: bool,
    pub connected: bool,
    pub gnss_powered: bool,
}

#[derive(Debug, Default)]
struct SimulatorState {
    session: SessionState,
    output: VecDeque<String>,
    written: Vec<String>,
}

impl SimulatorState {
    fn reply(&mut self, verb: &str, ok: bool) {
        let status = if ok { "SUCCESS" } else { "ERROR" };
        self.output.push_back(format!("+{verb}: {status}"));
    }

    fn respond(&mut self, command: &str) {
        let SessionState {
            created, connected, ..
        } = self.session;

        match command {
            "AT+IOTCREATE\r\n" => {
                self.reply("IOTCREATE", !created);
                self.session.created = true;
            }
            "AT+IOTDESTROY\r\n" => {
                self.reply("IOTDESTROY", created);
                if created {
                    self.session.created = false;
                    self.session.connected = false;
                }
            }
            "AT+IOTCONNECT?\r\n" => {
                let answer = if connected { "TRUE" } else { "FALSE" };
                self.output.push_back(format!("+IOTCONNECT: {answer}"));
            }
            // The dummy modem only reports success when already disconnected
            // and never clears the connected flag.
            "AT+IOTDISCONNECT\r\n" => self.reply("IOTDISCONNECT", !connected),
            "AT+IOTINFO\r\n" => self.output.push_back(SIMULATED_INFO.to_string()),
            "AT+IOTCGNSINF\r\n" => self.output.push_back(SIMULATED_FIX.to_string()),
            "AT+IOTTEST\r\n" => self.reply("IOTTEST", true),
            _ if command.starts_with("AT+IOTCONNECT=") => {
                let ok = created && !connected;
                self.reply("IOTCONNECT", ok);
                if ok {
                    self.session.connected = true;
                }
            }
            _ if command.starts_with("AT+IOTPUBLISH=") => {
                self.reply("IOTPUBLISH", created && connected)
            }
            _ if command.starts_with("AT+IOTSUBSCRIBE=") => {
                self.reply("IOTSUBSCRIBE", created && connected)
            }
            _ if command.starts_with("AT+IOTUNSUBSCRIBE=") => {
                self.reply("IOTUNSUBSCRIBE", created && connected)
            }
            _ if command.starts_with("AT+IOTREGPRE=") => {
                self.reply("IOTREGPRE", created && !connected)
            }
            _ if command.starts_with("AT+IOTSLEEP=") => {
                self.reply("IOTSLEEP", created && connected)
            }
            _ if command.starts_with("AT+IOTCGNSPWR=") => {
                if created {
                    self.session.gnss_powered = command == "AT+IOTCGNSPWR=1\r\n";
                }
                self.reply("IOTCGNSPWR", created);
            }
            _ if command.starts_with("AT+IOTDEBUG=") => self.reply("IOTDEBUG", true),
            _ => trace!("simulator ignoring {:?}", command),
        }
    }
}

/// A simulated Thingstream Click.
///
/// Clones share the same modem, so a test can hold one handle to inject
/// notifications and inspect session state while the driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ModemSimulator {
    state: Arc<Mutex<SimulatorState>>,
}

impl ModemSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state of the simulated modem.
    pub fn session(&self) -> SessionState {
        self.state.lock().session
    }

    /// Queue a line as if the modem had pushed it unprompted.
    pub fn inject(&self, line: &str) {
        self.state.lock().output.push_back(line.to_string());
    }

    /// Queue an incoming message notification for `topic`.
    pub fn deliver(&self, topic: &str, payload: &str) {
        self.inject(&format!("+IOTRECEIVE: {topic},{payload}"));
    }

    /// Queue a server-initiated disconnect.
    pub fn drop_connection(&self) {
        let mut state = self.state.lock();
        state.session.connected = false;
        state.output.push_back("+IOTSERVERDISCONNECT: OK".to_string());
    }

    /// Every command written to the simulator, in order.
    pub fn written(&self) -> Vec<String> {
        self.state.lock().written.clone()
    }
}

impl LineSource for ModemSimulator {
    fn init(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.session = SessionState::default();
        state.output.clear();
        Ok(())
    }

    fn available(&self) -> usize {
        self.state.lock().output.front().map_or(0, |line| line.len())
    }

    fn readline(&mut self) -> String {
        self.state.lock().output.pop_front().unwrap_or_default()
    }

    fn write(&mut self, text: &str) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.written.push(text.to_string());
        state.respond(text);
        Ok(text.len())
    }

    fn deinit(&mut self) {}
}
