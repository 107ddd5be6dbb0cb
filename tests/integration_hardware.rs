//! Tests against a real Thingstream Click.
//!
//! Requires the modem on a serial port and the `hardware-tests` feature.
//! Run with: TEST_PORT=/dev/ttyACM0 cargo test --features hardware-tests -- --ignored

#![cfg(feature = "hardware-tests")]

use std::env;
use thingstream_click::{PortConfiguration, SerialLineSource, ThingstreamClick};

fn hardware_click() -> Option<ThingstreamClick<SerialLineSource>> {
    let port_name = env::var("TEST_PORT").ok()?;
    let mut config = PortConfiguration::default();
    if let Some(baud) = env::var("TEST_BAUD").ok().and_then(|s| s.parse().ok()) {
        config.baud_rate = baud;
    }
    Some(ThingstreamClick::new(SerialLineSource::new(port_name, config)))
}

#[test]
#[ignore]
fn test_modem_identifies_itself() {
    let Some(mut click) = hardware_click() else {
        eprintln!("TEST_PORT not set, skipping");
        return;
    };

    assert!(click.init(), "init failed: {:?}", click.last_error());
    assert!(click.info().starts_with("+IOTINFO:"));
    assert!(click.self_test(), "self-test failed: {:?}", click.last_error());
    click.deinit();
}

#[test]
#[ignore]
fn test_session_round_trip() {
    let Some(mut click) = hardware_click() else {
        eprintln!("TEST_PORT not set, skipping");
        return;
    };

    assert!(click.init());
    // A session left over from an earlier run makes create fail; destroy first.
    click.destroy();
    assert!(click.create(), "create failed: {:?}", click.last_error());
    assert!(click.connect(true, None), "connect failed: {:?}", click.last_error());
    assert!(click.is_connected());
    assert!(click.publish("test/thingstream-click", "hello", 0, None));
    assert!(click.destroy());
    click.deinit();
}
