//! Host wiring
//!
//! Turns the configuration into the core's platform collaborators and a
//! ready `SnapshotBuilder`.

use crate::config::{AgentConfig, RadioSourceKind};
use anyhow::{Context, Result};
use netprobe_core::radio::{ModemManagerSource, NoRadio, RadioInfoSource, StateFileSource};
use netprobe_core::snapshot::{current_locale, parse_locale};
use netprobe_core::{
    FileStore, HostInterfaces, IdentityResolver, InstallationIdSource, InterfaceSource,
    KeyValueStore, Locale, MachineIdFile, PlatformCapabilities, PlatformLevel, SnapshotBuilder,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn capabilities(config: &AgentConfig) -> PlatformCapabilities {
    let caps = PlatformCapabilities::for_level(PlatformLevel(config.platform.level));
    for capability in caps.describe() {
        match &capability.reason {
            Some(reason) => debug!("{:?} unavailable: {}", capability.capability_type, reason),
            None => debug!("{:?} available", capability.capability_type),
        }
    }
    caps
}

pub fn radio_source(config: &AgentConfig) -> Result<Box<dyn RadioInfoSource>> {
    let source: Box<dyn RadioInfoSource> = match config.radio.source {
        RadioSourceKind::ModemManager => Box::new(ModemManagerSource::new(config.radio.modem_id.clone())),
        RadioSourceKind::StateFile => {
            let path = config
                .radio
                .state_file
                .clone()
                .context("radio.source = \"state_file\" requires radio.state_file")?;
            Box::new(StateFileSource::new(path))
        }
        RadioSourceKind::Disabled => Box::new(NoRadio),
    };
    debug!("Radio source: {:?}", config.radio.source);
    Ok(source)
}

pub fn locale(config: &AgentConfig) -> Locale {
    match config.locale.as_deref() {
        Some(name) => parse_locale(name).unwrap_or_else(|| {
            warn!("Unknown locale {:?}, using environment locale", name);
            current_locale()
        }),
        None => current_locale(),
    }
}

pub fn identity_resolver(
    config: &AgentConfig,
    caps: PlatformCapabilities,
    interfaces: Arc<dyn InterfaceSource>,
) -> Result<IdentityResolver> {
    let store_path = config.store_path()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&store_path));
    let installation: Arc<dyn InstallationIdSource> = match &config.identity.installation_id_path {
        Some(path) => Arc::new(MachineIdFile::new(path)),
        None => Arc::new(MachineIdFile::default()),
    };
    debug!("Identity store at {:?}", store_path);

    Ok(IdentityResolver::new(caps, interfaces, store, installation)
        .with_wifi_interface(config.identity.wifi_interface.clone()))
}

/// Builder over the host's real interfaces
pub fn snapshot_builder(config: &AgentConfig) -> Result<SnapshotBuilder> {
    snapshot_builder_with(config, Arc::new(HostInterfaces))
}

pub fn snapshot_builder_with(
    config: &AgentConfig,
    interfaces: Arc<dyn InterfaceSource>,
) -> Result<SnapshotBuilder> {
    let caps = capabilities(config);
    let radio = radio_source(config)?;
    let identity = identity_resolver(config, caps, interfaces.clone())?;
    let locale = locale(config);

    info!(
        "Snapshot builder ready - platform level {}, identity {:?}",
        caps.level.0,
        caps.identity_strategy()
    );
    Ok(SnapshotBuilder::new(caps, radio, interfaces, identity).with_locale(locale))
}
