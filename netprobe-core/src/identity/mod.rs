//! Stable device identity
//!
//! Produces a MAC-shaped identifier (`XX:XX:XX:XX:XX:XX`):
//! - Legacy platforms: the WiFi interface hardware address, or "" if absent
//! - Modern platforms: a pseudo-identifier synthesized once from the
//!   installation id plus a random UUID, persisted and reused afterwards

pub mod store;

use crate::capabilities::{IdentityStrategy, PlatformCapabilities};
use crate::error::{IdentityError, TelemetryError};
use crate::interfaces::{format_mac, InterfaceSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreKey};

/// Namespace of the persisted identifier.
pub const STORE_NAMESPACE: &str = "netprobe_preferences";
/// Key of the persisted identifier.
pub const DEVICE_IDENTIFIER_KEY: &str = "device_identifier";
/// Number of seed characters making up a pseudo-MAC.
pub const PSEUDO_MAC_CHARS: usize = 12;

/// Default name of the WiFi interface.
pub const DEFAULT_WIFI_INTERFACE: &str = "wlan0";

/// Installation-scoped identifier provided by the platform.
pub trait InstallationIdSource: Send + Sync {
    fn installation_id(&self) -> Result<String, TelemetryError>;
}

/// systemd/D-Bus machine id files.
#[derive(Debug, Clone)]
pub struct MachineIdFile {
    candidates: Vec<PathBuf>,
}

impl MachineIdFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }
}

impl Default for MachineIdFile {
    fn default() -> Self {
        Self {
            candidates: vec![
                PathBuf::from("/etc/machine-id"),
                PathBuf::from("/var/lib/dbus/machine-id"),
            ],
        }
    }
}

impl InstallationIdSource for MachineIdFile {
    fn installation_id(&self) -> Result<String, TelemetryError> {
        for path in &self.candidates {
            match std::fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => return Ok(content.trim().to_string()),
                Ok(_) => debug!("Empty machine id at {:?}", path),
                Err(e) => debug!("Cannot read machine id at {:?}: {}", path, e),
            }
        }
        Err(TelemetryError::SourceUnavailable("no machine id file".into()))
    }
}

/// Format the first twelve hex digits of the seed as six colon-separated
/// pairs. Other characters (dashes, whitespace) are skipped.
pub fn pseudo_mac(seed: &str) -> Result<String, IdentityError> {
    let chars: Vec<char> = seed
        .chars()
        .filter(char::is_ascii_hexdigit)
        .take(PSEUDO_MAC_CHARS)
        .collect();
    if chars.len() < PSEUDO_MAC_CHARS {
        return Err(IdentityError::InvalidIdentitySource {
            needed: PSEUDO_MAC_CHARS,
            actual: chars.len(),
        });
    }

    Ok(chars
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>().to_uppercase())
        .collect::<Vec<_>>()
        .join(":"))
}

/// Resolves the device identifier for one platform.
pub struct IdentityResolver {
    caps: PlatformCapabilities,
    interfaces: Arc<dyn InterfaceSource>,
    store: Arc<dyn KeyValueStore>,
    installation_id: Arc<dyn InstallationIdSource>,
    random_id: fn() -> String,
    wifi_interface: String,
    key: StoreKey,
}

impl IdentityResolver {
    pub fn new(
        caps: PlatformCapabilities,
        interfaces: Arc<dyn InterfaceSource>,
        store: Arc<dyn KeyValueStore>,
        installation_id: Arc<dyn InstallationIdSource>,
    ) -> Self {
        Self {
            caps,
            interfaces,
            store,
            installation_id,
            random_id: || Uuid::new_v4().simple().to_string(),
            wifi_interface: DEFAULT_WIFI_INTERFACE.to_string(),
            key: StoreKey::new(STORE_NAMESPACE, DEVICE_IDENTIFIER_KEY),
        }
    }

    pub fn with_wifi_interface(mut self, name: impl Into<String>) -> Self {
        self.wifi_interface = name.into();
        self
    }

    /// Replace the random 128-bit id generator (hex digits, no hyphens by default).
    pub fn with_random_id(mut self, random_id: fn() -> String) -> Self {
        self.random_id = random_id;
        self
    }

    pub fn resolve(&self) -> Result<String, IdentityError> {
        match self.caps.identity_strategy() {
            IdentityStrategy::HardwareMac => Ok(self.hardware_mac()),
            IdentityStrategy::Persisted => self.persisted(),
        }
    }

    /// WiFi hardware address, "" when unavailable.
    fn hardware_mac(&self) -> String {
        match self.find_wifi_mac() {
            Ok(Some(bytes)) => format_mac(&bytes),
            Ok(None) => {
                debug!("No hardware address for {}", self.wifi_interface);
                String::new()
            }
            Err(e) => {
                warn!("Hardware address lookup failed: {}", e);
                String::new()
            }
        }
    }

    fn find_wifi_mac(&self) -> Result<Option<[u8; 6]>, TelemetryError> {
        // Interfaces without a bound address still carry a hardware address
        self.interfaces.hardware_address(&self.wifi_interface)
    }

    /// Stored identifier, synthesized on first use. Store failures degrade
    /// to "", only a short seed is an error.
    fn persisted(&self) -> Result<String, IdentityError> {
        match self.store.get_or_insert_with(&self.key, &mut || self.synthesize()) {
            Err(IdentityError::Store(e)) => {
                warn!("Identity store unavailable: {}", e);
                Ok(String::new())
            }
            other => other,
        }
    }

    fn synthesize(&self) -> Result<String, IdentityError> {
        let installation_id = self.installation_id.installation_id().unwrap_or_else(|e| {
            warn!("Installation id unavailable, seeding from random id only: {}", e);
            String::new()
        });
        let seed = format!("{}{}", installation_id, (self.random_id)());
        let identifier = pseudo_mac(&seed)?;
        info!("Synthesized device identifier {}", identifier);
        Ok(identifier)
    }
}
