//! Method-call surface for external callers
//!
//! A caller names a channel and a method; the channel answers with a
//! success map, an error code or "not implemented". The transport (MQTT
//! bridge, local CLI) lives outside this crate.

use crate::snapshot::SnapshotBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Channel name callers address.
pub const CHANNEL_NAME: &str = "telephony_channel";

/// The only method the channel implements.
pub const GET_TELEPHONY_INFO: &str = "getTelephonyInfo";

/// Result of one method call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Success { result: BTreeMap<String, String> },
    Error { code: String, message: String },
    NotImplemented,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }
}

/// Answers method calls on `telephony_channel`.
pub struct TelephonyChannel {
    builder: SnapshotBuilder,
}

impl TelephonyChannel {
    pub fn new(builder: SnapshotBuilder) -> Self {
        Self { builder }
    }

    pub fn name(&self) -> &'static str {
        CHANNEL_NAME
    }

    pub fn builder(&self) -> &SnapshotBuilder {
        &self.builder
    }

    /// Dispatch one call. Arguments are ignored; `getTelephonyInfo` takes none.
    pub fn handle(&self, method: &str) -> CallOutcome {
        debug!("Call {} on {}", method, CHANNEL_NAME);
        match method {
            GET_TELEPHONY_INFO => match self.builder.build() {
                Ok(snapshot) => CallOutcome::Success {
                    result: snapshot.to_map(self.builder.locale()),
                },
                Err(e) => {
                    warn!("{} failed: {}", GET_TELEPHONY_INFO, e);
                    CallOutcome::Error {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    }
                }
            },
            other => {
                debug!("Unknown method {}", other);
                CallOutcome::NotImplemented
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::PlatformCapabilities;
    use crate::error::TelemetryError;
    use crate::identity::{FileStore, IdentityResolver, InstallationIdSource, MemoryStore};
    use crate::interfaces::{InterfaceAddress, InterfaceSource};
    use crate::radio::NoRadio;
    use chrono::Locale;
    use std::sync::Arc;

    struct Offline;

    impl InterfaceSource for Offline {
        fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError> {
            Ok(Vec::new())
        }

        fn hardware_address(&self, _name: &str) -> Result<Option<[u8; 6]>, TelemetryError> {
            Ok(None)
        }
    }

    struct Installation(&'static str);

    impl InstallationIdSource for Installation {
        fn installation_id(&self) -> Result<String, TelemetryError> {
            Ok(self.0.to_string())
        }
    }

    fn channel(installation: &'static str, random: fn() -> String) -> TelephonyChannel {
        let caps = PlatformCapabilities::default();
        let interfaces: Arc<dyn InterfaceSource> = Arc::new(Offline);
        let identity = IdentityResolver::new(
            caps,
            interfaces.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(Installation(installation)),
        )
        .with_random_id(random);
        let builder = SnapshotBuilder::new(caps, Box::new(NoRadio), interfaces, identity)
            .with_locale(Locale::en_US);
        TelephonyChannel::new(builder)
    }

    #[test]
    fn test_get_telephony_info_success() {
        let channel = channel("9774d56d682e549c", || "ffffffff".to_string());
        match channel.handle(GET_TELEPHONY_INFO) {
            CallOutcome::Success { result } => {
                assert_eq!(result.len(), 9);
                assert_eq!(result["macAddress"], "97:74:D5:6D:68:2E");
                assert_eq!(result["networkType"], "Unknown");
                assert_eq!(result["signalPower"], "N/A");
                assert_eq!(result["cellId"], "");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_identity_failure_maps_to_error() {
        let channel = channel("", || "abcde".to_string());
        match channel.handle(GET_TELEPHONY_INFO) {
            CallOutcome::Error { code, message } => {
                assert_eq!(code, "MALFORMED_INPUT");
                assert!(message.contains("got 5"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_identity_store_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        std::fs::write(&path, "{ not json").unwrap();

        let caps = PlatformCapabilities::default();
        let interfaces: Arc<dyn InterfaceSource> = Arc::new(Offline);
        let identity = IdentityResolver::new(
            caps,
            interfaces.clone(),
            Arc::new(FileStore::new(&path)),
            Arc::new(Installation("9774d56d682e549c")),
        );
        let builder = SnapshotBuilder::new(caps, Box::new(NoRadio), interfaces, identity)
            .with_locale(Locale::en_US);

        match TelephonyChannel::new(builder).handle(GET_TELEPHONY_INFO) {
            CallOutcome::Success { result } => {
                assert_eq!(result.len(), 9);
                assert_eq!(result["macAddress"], "");
                assert_eq!(result["networkType"], "Unknown");
            }
            other => panic!("expected success, got {:?}", other),
        }
        // The corrupt document is left alone.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_unknown_method() {
        let channel = channel("9774d56d682e549c", || "ffffffff".to_string());
        assert_eq!(channel.handle("getBatteryLevel"), CallOutcome::NotImplemented);
        assert_eq!(channel.name(), "telephony_channel");
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(CallOutcome::NotImplemented).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "not_implemented" }));

        let error = CallOutcome::Error { code: "X".into(), message: "m".into() };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "X");
    }
}
