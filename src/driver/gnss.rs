//! GNSS fix workflow: power on, wait, query, power off.

use super::ThingstreamClick;
use crate::error::CommandError;
use crate::port::LineSource;
use crate::protocol::GNSS_INFO_PREFIX;
use std::time::Duration;
use tracing::{debug, warn};

impl<L: LineSource> ThingstreamClick<L> {
    /// Power the receiver on, wait `wait_seconds`, read the telemetry line
    /// and, if `power_off_after`, power the receiver off again.
    ///
    /// Power-off happens whatever the query returned. The result is the raw
    /// `+IOTCGNSINF:` line, or an empty string if the answer did not start
    /// with that prefix.
    pub fn get_fix(&mut self, wait_seconds: u64, power_off_after: bool) -> String {
        if !self.gnss_power(true) {
            debug!("GNSS power-on not confirmed: {:?}", self.last_error);
        }

        (self.delay)(Duration::from_secs(wait_seconds));

        let telemetry = self.gnss_info();
        let query_error = self.last_error.take();

        if power_off_after && !self.gnss_power(false) {
            warn!("GNSS power-off not confirmed: {:?}", self.last_error);
        }

        if telemetry.starts_with(GNSS_INFO_PREFIX) {
            telemetry
        } else {
            self.last_error = Some(query_error.unwrap_or(CommandError::UnexpectedResponse {
                expected: GNSS_INFO_PREFIX.to_string(),
                received: telemetry,
            }));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CommandError;
    use crate::port::ScriptedLineSource;
    use crate::ThingstreamClick;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    const FIX: &str = "+IOTCGNSINF: ,1,20190729224430.000,50.7214446,-1.8805652,18.379,1.63,120.5,1,,3.3,3.5,1.0,,7,4,,,35,,";

    fn recording_driver(
        source: ScriptedLineSource,
    ) -> (ThingstreamClick<ScriptedLineSource>, Arc<Mutex<Vec<Duration>>>) {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let sink = waits.clone();
        let click = ThingstreamClick::new(source).with_delay(move |d| sink.lock().push(d));
        (click, waits)
    }

    #[test]
    fn test_power_off_runs_even_when_query_is_malformed() {
        let mut source = ScriptedLineSource::new();
        source.expect("AT+IOTCGNSPWR=1\r\n", &["+IOTCGNSPWR: SUCCESS"]);
        source.expect("AT+IOTCGNSINF\r\n", &["GARBAGE"]);
        source.expect("AT+IOTCGNSPWR=0\r\n", &["+IOTCGNSPWR: SUCCESS"]);
        let (mut click, waits) = recording_driver(source.clone());

        assert_eq!(click.get_fix(3, true), "");
        assert_eq!(source.remaining_expectations(), 0);
        assert_eq!(*waits.lock(), vec![Duration::from_secs(3)]);
        assert!(matches!(
            click.last_error(),
            Some(CommandError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_keeps_receiver_on_when_asked() {
        let mut source = ScriptedLineSource::new();
        source.expect("AT+IOTCGNSPWR=1\r\n", &["+IOTCGNSPWR: SUCCESS"]);
        source.expect("AT+IOTCGNSINF\r\n", &[FIX]);
        let (mut click, _) = recording_driver(source.clone());

        assert_eq!(click.get_fix(0, false), FIX);
        assert_eq!(source.sent().len(), 2);
    }

    #[test]
    fn test_query_error_survives_power_off() {
        let mut source = ScriptedLineSource::new();
        source.expect("AT+IOTCGNSPWR=1\r\n", &["+IOTCGNSPWR: SUCCESS"]);
        source.expect("AT+IOTCGNSINF\r\n", &["BUSY"]);
        source.expect("AT+IOTCGNSPWR=0\r\n", &["+IOTCGNSPWR: SUCCESS"]);
        let (mut click, _) = recording_driver(source);

        assert_eq!(click.get_fix(1, true), "");
        assert_eq!(
            click.last_error(),
            Some(&CommandError::ModemBusy("BUSY".into()))
        );
    }
}
