/*!
# NetProbe DevKit - Fakes and fixtures for tests

Helpers for testing NetProbe without a modem, a WiFi chip or a broker:
- Scripted radio source and interface table
- Fixed installation id
- Cell-record fixtures for every radio technology
- Recording MQTT client
*/

pub mod fakes;
pub mod fixtures;
pub mod mqtt_stub;

pub use fakes::{FixedInstallationId, ScriptedInterfaces, ScriptedRadio};
pub use mqtt_stub::{CallBuilder, MockMessage, MockMqttClient};

/// Route `log` records (and `tracing` events through its `log` feature) to
/// the test output. Safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
