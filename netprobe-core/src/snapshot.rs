//! Telemetry snapshot assembly
//!
//! One call gathers the radio view, cellular metrics, generation, device
//! identifier and IPv4 address into an immutable record. Every field has its
//! own fallback, so only a hard identity failure can make `build` fail.

use crate::capabilities::PlatformCapabilities;
use crate::cellular::CellMetrics;
use crate::error::IdentityError;
use crate::generation::{classify, Generation};
use crate::identity::IdentityResolver;
use crate::interfaces::{first_ipv4_address, InterfaceSource};
use crate::radio::{RadioInfoSource, RadioView};
use chrono::{DateTime, Local, Locale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// `dd MMM yyyy hh:mm a`
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y %I:%M %p";

/// Sentinel for numeric fields without data.
pub const NOT_AVAILABLE: &str = "N/A";

/// Point-in-time telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub operator_name: String,
    pub signal_power_dbm: Option<i32>,
    pub snr_estimate: Option<i32>,
    pub generation: Generation,
    pub frequency_channel: Option<String>,
    pub cell_identity: Option<String>,
    pub mac_or_identity: String,
    pub ip_address: String,
    pub captured_at: DateTime<Local>,
}

/// The snapshot flattened to strings, as handed to remote callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFields {
    pub operator: String,
    pub signal_power: String,
    pub sinr: String,
    pub network_type: String,
    pub frequency_band: String,
    pub cell_id: String,
    pub mac_address: String,
    pub ip_address: String,
    pub time_stamp: String,
}

impl TelemetrySnapshot {
    pub fn fields(&self, locale: Locale) -> TelemetryFields {
        let numeric = |value: Option<i32>| {
            value
                .map(|v| v.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        TelemetryFields {
            operator: self.operator_name.clone(),
            signal_power: numeric(self.signal_power_dbm),
            sinr: numeric(self.snr_estimate),
            network_type: self.generation.to_string(),
            frequency_band: self.frequency_channel.clone().unwrap_or_default(),
            cell_id: self.cell_identity.clone().unwrap_or_default(),
            mac_address: self.mac_or_identity.clone(),
            ip_address: self.ip_address.clone(),
            time_stamp: format_timestamp(&self.captured_at, locale),
        }
    }

    pub fn to_map(&self, locale: Locale) -> BTreeMap<String, String> {
        self.fields(locale).into_map()
    }
}

impl TelemetryFields {
    pub fn into_map(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("operator".to_string(), self.operator),
            ("signalPower".to_string(), self.signal_power),
            ("sinr".to_string(), self.sinr),
            ("networkType".to_string(), self.network_type),
            ("frequencyBand".to_string(), self.frequency_band),
            ("cellId".to_string(), self.cell_id),
            ("macAddress".to_string(), self.mac_address),
            ("ipAddress".to_string(), self.ip_address),
            ("timeStamp".to_string(), self.time_stamp),
        ])
    }
}

pub fn format_timestamp(at: &DateTime<Local>, locale: Locale) -> String {
    at.format_localized(TIMESTAMP_FORMAT, locale).to_string()
}

/// Parse a POSIX locale name such as `fr_FR.UTF-8` or `de_DE@euro`.
pub fn parse_locale(name: &str) -> Option<Locale> {
    let base = name.split(['.', '@']).next().unwrap_or(name).trim();
    match base {
        "" => None,
        "C" | "POSIX" => Some(Locale::POSIX),
        other => Locale::try_from(other).ok(),
    }
}

/// Locale of the calling environment (`LC_ALL`, `LC_TIME`, then `LANG`).
pub fn current_locale() -> Locale {
    ["LC_ALL", "LC_TIME", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| parse_locale(&value))
        .unwrap_or(Locale::POSIX)
}

/// Orchestrates one snapshot.
pub struct SnapshotBuilder {
    caps: PlatformCapabilities,
    radio: Box<dyn RadioInfoSource>,
    interfaces: Arc<dyn InterfaceSource>,
    identity: IdentityResolver,
    locale: Locale,
}

impl SnapshotBuilder {
    pub fn new(
        caps: PlatformCapabilities,
        radio: Box<dyn RadioInfoSource>,
        interfaces: Arc<dyn InterfaceSource>,
        identity: IdentityResolver,
    ) -> Self {
        Self {
            caps,
            radio,
            interfaces,
            identity,
            locale: current_locale(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.caps
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn build(&self) -> Result<TelemetrySnapshot, IdentityError> {
        self.build_at(Local::now())
    }

    pub fn build_at(&self, captured_at: DateTime<Local>) -> Result<TelemetrySnapshot, IdentityError> {
        debug!("Building telemetry snapshot...");

        let view = RadioView::capture(self.radio.as_ref(), self.caps);
        let generation = classify(view.network_type());
        let metrics = CellMetrics::extract(&view);
        let mac_or_identity = self.identity.resolve()?;
        let ip_address = first_ipv4_address(self.interfaces.as_ref());

        let snapshot = TelemetrySnapshot {
            operator_name: view.operator_name().to_string(),
            signal_power_dbm: metrics.signal_power_dbm,
            snr_estimate: metrics.snr_estimate,
            generation,
            frequency_channel: metrics.frequency_channel,
            cell_identity: metrics.cell_identity,
            mac_or_identity,
            ip_address,
            captured_at,
        };

        info!(
            "Snapshot captured - Network: {}, Cell: {}, IP: {}",
            snapshot.generation,
            snapshot.cell_identity.as_deref().unwrap_or("-"),
            snapshot.ip_address
        );
        Ok(snapshot)
    }

    /// Build and flatten in the builder's locale.
    pub fn build_fields(&self) -> Result<TelemetryFields, IdentityError> {
        Ok(self.build()?.fields(self.locale))
    }
}
