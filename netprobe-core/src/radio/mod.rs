//! Raw radio state and the capability-gated view over it
//!
//! A `RadioInfoSource` is queried once per snapshot. The returned state is
//! wrapped in a `RadioView` which applies the platform gates, so the
//! extractor never sees data the running platform could not have provided.

pub mod mmcli;
pub mod state_file;

use crate::capabilities::PlatformCapabilities;
use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use mmcli::ModemManagerSource;
pub use state_file::StateFileSource;

/// Network-type codes of the platform enumeration.
pub mod network_type {
    pub const UNKNOWN: i32 = 0;
    pub const GPRS: i32 = 1;
    pub const EDGE: i32 = 2;
    pub const UMTS: i32 = 3;
    pub const CDMA: i32 = 4;
    pub const EVDO_0: i32 = 5;
    pub const EVDO_A: i32 = 6;
    pub const ONE_X_RTT: i32 = 7;
    pub const HSDPA: i32 = 8;
    pub const HSUPA: i32 = 9;
    pub const HSPA: i32 = 10;
    pub const IDEN: i32 = 11;
    pub const EVDO_B: i32 = 12;
    pub const LTE: i32 = 13;
    pub const EHRPD: i32 = 14;
    pub const HSPAP: i32 = 15;
    pub const GSM: i32 = 16;
    pub const TD_SCDMA: i32 = 17;
    pub const IWLAN: i32 = 18;
    pub const NR: i32 = 20;
}

/// One cell record as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCellRecord {
    /// Serving/registered cell as opposed to a visible neighbour.
    #[serde(default)]
    pub registered: bool,
    #[serde(flatten)]
    pub variant: CellVariant,
}

/// Radio technology of a cell record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellVariant {
    Gsm(GsmCell),
    Lte(LteCell),
    Wcdma(WcdmaCell),
    /// Reported by newer platforms, not interpreted by the extractor.
    Nr(NrCell),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GsmCell {
    #[serde(default)]
    pub identity: GsmIdentity,
    #[serde(default)]
    pub signal: GsmSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GsmIdentity {
    pub mcc: Option<u16>,
    pub cid: Option<u64>,
    pub arfcn: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GsmSignal {
    pub dbm: Option<i32>,
    pub bit_error_rate: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcdmaCell {
    #[serde(default)]
    pub identity: WcdmaIdentity,
    #[serde(default)]
    pub signal: WcdmaSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcdmaIdentity {
    pub mcc: Option<u16>,
    pub cid: Option<u64>,
    pub uarfcn: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcdmaSignal {
    pub dbm: Option<i32>,
    pub ecno: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LteCell {
    #[serde(default)]
    pub identity: LteIdentity,
    #[serde(default)]
    pub signal: LteSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LteIdentity {
    pub mcc: Option<u16>,
    /// 28-bit E-UTRAN cell identity.
    pub ci: Option<u64>,
    pub earfcn: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LteSignal {
    pub dbm: Option<i32>,
    /// Reference Signal Received Power, dBm.
    pub rsrp: Option<i32>,
    /// Received Signal Strength Indicator on a linear scale.
    pub rssi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrCell {
    #[serde(default)]
    pub identity: NrIdentity,
    #[serde(default)]
    pub signal: NrSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrIdentity {
    pub mcc: Option<u16>,
    pub nci: Option<u64>,
    pub nrarfcn: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrSignal {
    pub ss_rsrp: Option<i32>,
    pub ss_sinr: Option<i32>,
}

/// Everything one radio query returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioState {
    #[serde(default)]
    pub operator_name: String,
    #[serde(default)]
    pub network_type: i32,
    /// `None` when the platform returned no list at all.
    #[serde(default)]
    pub cells: Option<Vec<RawCellRecord>>,
}

/// Accessor over the platform's raw radio state.
pub trait RadioInfoSource: Send + Sync {
    fn query(&self) -> Result<RadioState, TelemetryError>;
}

impl<T: RadioInfoSource + ?Sized> RadioInfoSource for Box<T> {
    fn query(&self) -> Result<RadioState, TelemetryError> {
        (**self).query()
    }
}

/// Source for hosts without any radio.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRadio;

impl RadioInfoSource for NoRadio {
    fn query(&self) -> Result<RadioState, TelemetryError> {
        Ok(RadioState::default())
    }
}

/// One radio query filtered through the platform gates.
#[derive(Debug, Clone)]
pub struct RadioView {
    state: RadioState,
    caps: PlatformCapabilities,
}

impl RadioView {
    pub fn new(state: RadioState, caps: PlatformCapabilities) -> Self {
        Self { state, caps }
    }

    /// Query the source once. A failed query yields an empty view.
    pub fn capture(source: &dyn RadioInfoSource, caps: PlatformCapabilities) -> Self {
        let state = match source.query() {
            Ok(state) => state,
            Err(e) => {
                warn!("Radio query failed, using empty radio state: {}", e);
                RadioState::default()
            }
        };
        Self::new(state, caps)
    }

    pub fn operator_name(&self) -> &str {
        &self.state.operator_name
    }

    pub fn network_type(&self) -> i32 {
        self.state.network_type
    }

    /// Full cell list, if the platform level exposes it.
    pub fn cells(&self) -> Result<&[RawCellRecord], TelemetryError> {
        if !self.caps.cell_info_list {
            return Err(TelemetryError::CapabilityUnavailable("cell info list"));
        }
        self.state
            .cells
            .as_deref()
            .ok_or_else(|| TelemetryError::SourceUnavailable("platform returned no cell list".into()))
    }

    /// First record flagged registered.
    pub fn serving_cell(&self) -> Result<&RawCellRecord, TelemetryError> {
        if !self.caps.serving_cell_metrics() {
            return Err(TelemetryError::CapabilityUnavailable("serving cell lookup"));
        }
        let cells = self.cells()?;
        let serving = cells.iter().find(|c| c.registered);
        if serving.is_none() {
            debug!("No registered cell among {} records", cells.len());
        }
        serving.ok_or_else(|| TelemetryError::SourceUnavailable("no registered cell".into()))
    }
}
