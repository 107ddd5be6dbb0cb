//! The AT command catalog.
//!
//! Each [`Command`] knows its wire form and, for commands with a fixed
//! success answer, the exact line that signals success.

use std::fmt;

/// Line terminator appended to every command.
pub const TERMINATOR: &str = "\r\n";

/// Prefix of a GNSS telemetry answer.
pub const GNSS_INFO_PREFIX: &str = "+IOTCGNSINF:";

/// Default QoS for publish and subscribe.
pub const DEFAULT_QOS: i8 = 1;

/// One modem command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Info,
    GnssPower(bool),
    GnssInfo,
    Create,
    /// `drop_messages` requests a clean session.
    Connect { drop_messages: bool },
    IsConnected,
    Disconnect,
    Destroy,
    Publish { topic: &'a str, qos: i8, message: &'a str },
    Subscribe { topic: &'a str, qos: i8 },
    Unsubscribe { topic: &'a str },
    RegisterAlias { topic: &'a str, alias: u32 },
    Sleep { minutes: u32 },
    Debug { mask: u8 },
    SelfTest,
}

impl Command<'_> {
    /// The full line to write, terminator included.
    pub fn wire(&self) -> String {
        format!("{self}{TERMINATOR}")
    }

    /// The line that signals success, for commands that have one.
    ///
    /// Read-style commands return `None`; their caller interprets the raw
    /// line itself.
    pub fn success_token(&self) -> Option<&'static str> {
        match self {
            Command::Info | Command::GnssInfo => None,
            Command::GnssPower(_) => Some("+IOTCGNSPWR: SUCCESS"),
            Command::Create => Some("+IOTCREATE: SUCCESS"),
            Command::Connect { .. } => Some("+IOTCONNECT: SUCCESS"),
            Command::IsConnected => Some("+IOTCONNECT: TRUE"),
            Command::Disconnect => Some("+IOTDISCONNECT: SUCCESS"),
            Command::Destroy => Some("+IOTDESTROY: SUCCESS"),
            Command::Publish { .. } => Some("+IOTPUBLISH: SUCCESS"),
            Command::Subscribe { .. } => Some("+IOTSUBSCRIBE: SUCCESS"),
            Command::Unsubscribe { .. } => Some("+IOTUNSUBSCRIBE: SUCCESS"),
            Command::RegisterAlias { .. } => Some("+IOTREGPRE: SUCCESS"),
            Command::Sleep { .. } => Some("+IOTSLEEP: SUCCESS"),
            Command::Debug { .. } => Some("+IOTDEBUG: SUCCESS"),
            Command::SelfTest => Some("+IOTTEST: SUCCESS"),
        }
    }
}

/// Writes the command without its terminator.
impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Info => write!(f, "AT+IOTINFO"),
            Command::GnssPower(on) => write!(f, "AT+IOTCGNSPWR={}", u8::from(*on)),
            Command::GnssInfo => write!(f, "AT+IOTCGNSINF"),
            Command::Create => write!(f, "AT+IOTCREATE"),
            Command::Connect { drop_messages } => write!(f, "AT+IOTCONNECT={drop_messages}"),
            Command::IsConnected => write!(f, "AT+IOTCONNECT?"),
            Command::Disconnect => write!(f, "AT+IOTDISCONNECT"),
            Command::Destroy => write!(f, "AT+IOTDESTROY"),
            Command::Publish {
                topic,
                qos,
                message,
            } => write!(f, "AT+IOTPUBLISH=\"{topic}\",{qos},\"{message}\""),
            Command::Subscribe { topic, qos } => write!(f, "AT+IOTSUBSCRIBE=\"{topic}\",{qos}"),
            Command::Unsubscribe { topic } => write!(f, "AT+IOTUNSUBSCRIBE=\"{topic}\""),
            Command::RegisterAlias { topic, alias } => {
                write!(f, "AT+IOTREGPRE=\"{topic}\",{alias}")
            }
            Command::Sleep { minutes } => write!(f, "AT+IOTSLEEP={minutes}"),
            Command::Debug { mask } => write!(f, "AT+IOTDEBUG={mask}"),
            Command::SelfTest => write!(f, "AT+IOTTEST"),
        }
    }
}

/// Debug output mask: bit 0 routes to the mikroBUS UART, bit 1 to USB.
pub fn debug_mask(mikrobus: bool, usb: bool) -> u8 {
    u8::from(mikrobus) | (u8::from(usb) << 1)
}
