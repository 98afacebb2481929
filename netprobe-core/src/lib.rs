//! NetProbe core - radio telemetry snapshots and stable device identity
//!
//! Modules:
//! - capabilities : platform level gates
//! - radio        : raw radio state, gated view, platform adapters
//! - generation   : network-type code to 2G/3G/4G bucket
//! - cellular     : signal power, SNR estimate, cell identity, frequency channel
//! - identity     : hardware MAC or persisted pseudo-identifier
//! - interfaces   : host interface enumeration, first IPv4 address
//! - snapshot     : one immutable telemetry record and its flattened form
//! - dispatch     : `telephony_channel` method-call surface
//!
//! Everything here is synchronous and blocking; async callers wrap `build`
//! in a blocking task.

pub mod capabilities;
pub mod cellular;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod identity;
pub mod interfaces;
pub mod radio;
pub mod snapshot;

pub use capabilities::{IdentityStrategy, PlatformCapabilities, PlatformLevel};
pub use cellular::CellMetrics;
pub use dispatch::{CallOutcome, TelephonyChannel, CHANNEL_NAME, GET_TELEPHONY_INFO};
pub use error::{IdentityError, StoreError, TelemetryError};
pub use generation::{classify, Generation};
pub use identity::{
    FileStore, IdentityResolver, InstallationIdSource, KeyValueStore, MachineIdFile, MemoryStore,
    StoreKey,
};
pub use interfaces::{first_ipv4_address, HostInterfaces, InterfaceAddress, InterfaceSource};
pub use radio::{
    CellVariant, ModemManagerSource, NoRadio, RadioInfoSource, RadioState, RadioView,
    RawCellRecord, StateFileSource,
};
pub use snapshot::{SnapshotBuilder, TelemetryFields, TelemetrySnapshot};

/// Locale type accepted by the formatting functions.
pub use chrono::Locale;
