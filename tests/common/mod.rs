//! Shared helpers for the integration tests.
//!
//! - simulator-backed drivers with a recording GNSS delay
//! - scripted drivers for exact wire checks

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thingstream_click::{ModemSimulator, ScriptedLineSource, ThingstreamClick};

pub type Waits = Arc<Mutex<Vec<Duration>>>;

/// A driver over a fresh simulator, already initialised.
///
/// Returns a second simulator handle for injecting lines and inspecting
/// state, plus the log of every GNSS wait the driver asked for.
pub fn simulated_click() -> (ThingstreamClick<ModemSimulator>, ModemSimulator, Waits) {
    let modem = ModemSimulator::new();
    let waits: Waits = Arc::new(Mutex::new(Vec::new()));
    let sink = waits.clone();
    let mut click = ThingstreamClick::new(modem.clone()).with_delay(move |d| sink.lock().push(d));
    assert!(click.init(), "simulator should identify itself");
    (click, modem, waits)
}

/// Like [`simulated_click`] with the session created and connected.
pub fn connected_click() -> (ThingstreamClick<ModemSimulator>, ModemSimulator, Waits) {
    let (mut click, modem, waits) = simulated_click();
    assert!(click.create());
    assert!(click.connect(false, None));
    (click, modem, waits)
}

/// A driver over a scripted source, plus a handle on the script.
pub fn scripted_click(
    max_retries: u32,
) -> (ThingstreamClick<ScriptedLineSource>, ScriptedLineSource) {
    let script = ScriptedLineSource::new();
    let click = ThingstreamClick::new(script.clone()).with_max_retries(max_retries);
    (click, script)
}

/// The commands written after initialisation.
pub fn written_after_init(modem: &ModemSimulator) -> Vec<String> {
    modem
        .written()
        .into_iter()
        .skip_while(|line| line == "AT+IOTINFO\r\n")
        .collect()
}
