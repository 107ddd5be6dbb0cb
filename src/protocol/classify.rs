//! Response classification.
//!
//! Every line the modem emits falls into one of five outcomes. The prefix
//! rules are checked in a fixed order, so a notification that happens to
//! start like a command response is still routed as a notification.

use serde::Serialize;

/// Prefix of an incoming message notification. These lines are queued.
pub const RECEIVE_PREFIX: &str = "+IOTRECEIVE:";

/// Prefix of a server-initiated disconnect. Sets the disconnect flag only.
pub const SERVER_DISCONNECT_PREFIX: &str = "+IOTSERVERDISCONNECT: OK";

pub const BUSY_PREFIX: &str = "BUSY";
pub const ERROR_PREFIX: &str = "ERROR";

/// An out-of-band event the modem pushed without being asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum AsyncEvent {
    /// A message arrived on a subscribed topic. Carries the full raw line.
    Received(String),
    /// The server closed the session.
    ServerDisconnect,
}

/// The result of classifying one received line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing arrived before the transport timeout.
    Timeout,
    /// An ordinary response line.
    Payload(String),
    /// An incidental notification, never the answer to a command.
    Async(AsyncEvent),
    Busy(String),
    ErrorResponse(String),
}

impl Outcome {
    /// Whether this outcome ends a command's read loop.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Outcome::Payload(_) | Outcome::Busy(_) | Outcome::ErrorResponse(_)
        )
    }

    /// Short tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Timeout => "timeout",
            Outcome::Payload(_) => "payload",
            Outcome::Async(_) => "async",
            Outcome::Busy(_) => "busy",
            Outcome::ErrorResponse(_) => "error",
        }
    }
}

/// Classify a single line.
///
/// This is pure. Applying the side effects of an [`Outcome::Async`] (queueing
/// the line, raising the disconnect flag) is the caller's job and happens once
/// per call, so classifying the same line twice and absorbing both results
/// queues it twice.
pub fn classify(line: &str) -> Outcome {
    if line.is_empty() {
        Outcome::Timeout
    } else if line.starts_with(RECEIVE_PREFIX) {
        Outcome::Async(AsyncEvent::Received(line.to_string()))
    } else if line.starts_with(SERVER_DISCONNECT_PREFIX) {
        Outcome::Async(AsyncEvent::ServerDisconnect)
    } else if line.starts_with(BUSY_PREFIX) {
        Outcome::Busy(line.to_string())
    } else if line.starts_with(ERROR_PREFIX) {
        Outcome::ErrorResponse(line.to_string())
    } else {
        Outcome::Payload(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_prefix_rules() {
        assert_eq!(classify(""), Outcome::Timeout);
        assert_eq!(
            classify("+IOTRECEIVE: hello"),
            Outcome::Async(AsyncEvent::Received("+IOTRECEIVE: hello".into()))
        );
        assert_eq!(
            classify("+IOTSERVERDISCONNECT: OK"),
            Outcome::Async(AsyncEvent::ServerDisconnect)
        );
        assert_eq!(classify("BUSY"), Outcome::Busy("BUSY".into()));
        assert_eq!(classify("ERROR: 3"), Outcome::ErrorResponse("ERROR: 3".into()));
        assert_eq!(
            classify("+IOTCREATE: SUCCESS"),
            Outcome::Payload("+IOTCREATE: SUCCESS".into())
        );
    }

    #[test]
    fn test_command_level_error_is_a_payload() {
        // Only a line that starts with ERROR is an error outcome.
        assert_eq!(
            classify("+IOTCREATE: ERROR"),
            Outcome::Payload("+IOTCREATE: ERROR".into())
        );
    }

    #[test]
    fn test_server_disconnect_needs_ok() {
        assert_eq!(
            classify("+IOTSERVERDISCONNECT: FAIL"),
            Outcome::Payload("+IOTSERVERDISCONNECT: FAIL".into())
        );
    }

    #[test]
    fn test_terminal_outcomes() {
        assert!(!Outcome::Timeout.is_terminal());
        assert!(!Outcome::Async(AsyncEvent::ServerDisconnect).is_terminal());
        assert!(Outcome::Busy("BUSY".into()).is_terminal());
        assert!(Outcome::ErrorResponse("ERROR".into()).is_terminal());
        assert!(Outcome::Payload("x".into()).is_terminal());
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(Outcome::Busy("BUSY".into())).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "busy", "detail": "BUSY"}));
    }

    proptest! {
        #[test]
        fn classify_is_stable(line in ".{0,64}") {
            prop_assert_eq!(classify(&line), classify(&line));
        }

        #[test]
        fn nonempty_lines_never_time_out(line in ".{1,64}") {
            prop_assert_ne!(classify(&line), Outcome::Timeout);
        }

        #[test]
        fn receive_lines_always_async(rest in "[ -~]{0,48}") {
            let line = format!("{RECEIVE_PREFIX}{rest}");
            prop_assert_eq!(classify(&line), Outcome::Async(AsyncEvent::Received(line.clone())));
        }
    }
}
