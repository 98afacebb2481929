/*!
Scripted platform collaborators

Each fake implements one of the core's platform traits and answers with
whatever the test scripted, or fails on demand.
*/

use netprobe_core::error::TelemetryError;
use netprobe_core::identity::InstallationIdSource;
use netprobe_core::interfaces::{InterfaceAddress, InterfaceSource};
use netprobe_core::radio::{RadioInfoSource, RadioState};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Radio source returning a fixed state and counting queries.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRadio {
    state: Option<RadioState>,
    queries: Arc<AtomicUsize>,
}

impl ScriptedRadio {
    pub fn new(state: RadioState) -> Self {
        Self {
            state: Some(state),
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every query fails with a transient error.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Shared query counter, readable after the source was boxed away.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.queries)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl RadioInfoSource for ScriptedRadio {
    fn query(&self) -> Result<RadioState, TelemetryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match &self.state {
            Some(state) => Ok(state.clone()),
            None => Err(TelemetryError::TransientQueryFailure("scripted radio failure".into())),
        }
    }
}

/// Interface table with optional hardware addresses.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInterfaces {
    addresses: Vec<InterfaceAddress>,
    macs: HashMap<String, [u8; 6]>,
    broken: bool,
}

impl ScriptedInterfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Append one address; panics on an unparsable IP.
    pub fn with_address(mut self, name: &str, ip: &str) -> Self {
        let ip: IpAddr = ip.parse().expect("fixture IP address");
        self.addresses.push(InterfaceAddress {
            name: name.to_string(),
            ip,
        });
        self
    }

    pub fn with_mac(mut self, name: &str, mac: [u8; 6]) -> Self {
        self.macs.insert(name.to_string(), mac);
        self
    }

    fn check(&self) -> Result<(), TelemetryError> {
        if self.broken {
            return Err(TelemetryError::TransientQueryFailure("scripted interface failure".into()));
        }
        Ok(())
    }
}

impl InterfaceSource for ScriptedInterfaces {
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError> {
        self.check()?;
        Ok(self.addresses.clone())
    }

    fn hardware_address(&self, name: &str) -> Result<Option<[u8; 6]>, TelemetryError> {
        self.check()?;
        Ok(self.macs.get(name).copied())
    }
}

/// Installation id that is either fixed or missing.
#[derive(Debug, Clone)]
pub struct FixedInstallationId(Option<String>);

impl FixedInstallationId {
    pub fn new(id: &str) -> Self {
        Self(Some(id.to_string()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl InstallationIdSource for FixedInstallationId {
    fn installation_id(&self) -> Result<String, TelemetryError> {
        self.0
            .clone()
            .ok_or_else(|| TelemetryError::SourceUnavailable("no installation id".into()))
    }
}
