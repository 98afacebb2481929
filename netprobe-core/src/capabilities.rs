//! Platform capability gates
//!
//! The platform exposes radio state and hardware addresses differently
//! depending on its feature level:
//! - Cell-info list (all visible cells) from level 17
//! - Serving-cell lookup through the registered flag from level 29
//! - Direct hardware MAC only below level 23, persisted pseudo-identifier above
//!
//! Capabilities are computed once and handed to every component, so none of
//! them inspects the platform version on its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Platform feature level (API-level style, monotonically increasing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformLevel(pub u32);

impl PlatformLevel {
    /// First level exposing the list of all cell records.
    pub const CELL_INFO_LIST: PlatformLevel = PlatformLevel(17);
    /// First level where the hardware MAC is hidden for privacy.
    pub const HARDWARE_MAC_RESTRICTED: PlatformLevel = PlatformLevel(23);
    /// First level where the registered flag can be used to find the serving cell.
    pub const SERVING_CELL_LOOKUP: PlatformLevel = PlatformLevel(29);
    /// Level assumed for hosts that do not report one.
    pub const CURRENT: PlatformLevel = PlatformLevel(34);
}

impl Default for PlatformLevel {
    fn default() -> Self {
        PlatformLevel::CURRENT
    }
}

/// How the device identifier is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Read the WiFi interface hardware address.
    HardwareMac,
    /// Synthesize once, persist, reuse.
    Persisted,
}

/// Capability names used in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    CellInfoList,
    ServingCellLookup,
    LegacyHardwareMac,
}

/// Capability detection result
#[derive(Debug, Clone)]
pub struct CapabilityInfo {
    pub capability_type: CapabilityType,
    pub available: bool,
    pub reason: Option<String>,
}

/// Feature gates for one platform level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub level: PlatformLevel,
    pub cell_info_list: bool,
    pub serving_cell_lookup: bool,
    pub legacy_hardware_mac: bool,
}

impl PlatformCapabilities {
    pub fn for_level(level: PlatformLevel) -> Self {
        let caps = Self {
            level,
            cell_info_list: level >= PlatformLevel::CELL_INFO_LIST,
            serving_cell_lookup: level >= PlatformLevel::SERVING_CELL_LOOKUP,
            legacy_hardware_mac: level < PlatformLevel::HARDWARE_MAC_RESTRICTED,
        };
        debug!("Platform level {} -> {:?}", level.0, caps);
        caps
    }

    /// Signal power, SNR and cell identity come from the serving cell and
    /// need both gates.
    pub fn serving_cell_metrics(&self) -> bool {
        self.cell_info_list && self.serving_cell_lookup
    }

    pub fn identity_strategy(&self) -> IdentityStrategy {
        if self.legacy_hardware_mac {
            IdentityStrategy::HardwareMac
        } else {
            IdentityStrategy::Persisted
        }
    }

    /// Per-capability report, with a reason for every missing one.
    pub fn describe(&self) -> Vec<CapabilityInfo> {
        let gate = |capability_type, available: bool, needed: PlatformLevel, below: bool| {
            let reason = if available {
                None
            } else if below {
                Some(format!("only below platform level {}", needed.0))
            } else {
                Some(format!("requires platform level {}", needed.0))
            };
            CapabilityInfo { capability_type, available, reason }
        };

        vec![
            gate(
                CapabilityType::CellInfoList,
                self.cell_info_list,
                PlatformLevel::CELL_INFO_LIST,
                false,
            ),
            gate(
                CapabilityType::ServingCellLookup,
                self.serving_cell_lookup,
                PlatformLevel::SERVING_CELL_LOOKUP,
                false,
            ),
            gate(
                CapabilityType::LegacyHardwareMac,
                self.legacy_hardware_mac,
                PlatformLevel::HARDWARE_MAC_RESTRICTED,
                true,
            ),
        ]
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::for_level(PlatformLevel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_level_gates() {
        let caps = PlatformCapabilities::for_level(PlatformLevel(34));
        assert!(caps.cell_info_list);
        assert!(caps.serving_cell_lookup);
        assert!(caps.serving_cell_metrics());
        assert_eq!(caps.identity_strategy(), IdentityStrategy::Persisted);
    }

    #[test]
    fn test_threshold_boundaries() {
        let at_mac_cutoff = PlatformCapabilities::for_level(PlatformLevel(23));
        assert!(!at_mac_cutoff.legacy_hardware_mac);

        let before_cutoff = PlatformCapabilities::for_level(PlatformLevel(22));
        assert_eq!(before_cutoff.identity_strategy(), IdentityStrategy::HardwareMac);
        assert!(before_cutoff.cell_info_list);
        assert!(!before_cutoff.serving_cell_metrics());

        let ancient = PlatformCapabilities::for_level(PlatformLevel(16));
        assert!(!ancient.cell_info_list);

        let q = PlatformCapabilities::for_level(PlatformLevel(29));
        assert!(q.serving_cell_lookup);
    }

    #[test]
    fn test_describe_gives_reasons_for_missing() {
        let caps = PlatformCapabilities::for_level(PlatformLevel(25));
        let report = caps.describe();
        assert_eq!(report.len(), 3);

        let serving = report
            .iter()
            .find(|c| c.capability_type == CapabilityType::ServingCellLookup)
            .unwrap();
        assert!(!serving.available);
        assert_eq!(serving.reason.as_deref(), Some("requires platform level 29"));

        let mac = report
            .iter()
            .find(|c| c.capability_type == CapabilityType::LegacyHardwareMac)
            .unwrap();
        assert_eq!(mac.reason.as_deref(), Some("only below platform level 23"));
    }
}
