//! Cellular metrics extraction
//!
//! Turns the gated radio view into the four cellular snapshot fields:
//! - Signal power (LTE only)
//! - SNR estimate (LTE only, heuristic)
//! - Cell identity `<mcc>-<cell id>` (GSM, LTE, WCDMA)
//! - Frequency channel (first GSM/LTE/WCDMA record of the full list)
//!
//! NR records are never interpreted. Missing data of any kind yields `None`.

use crate::radio::{CellVariant, LteSignal, RadioView, RawCellRecord};
use serde::Serialize;
use tracing::debug;

/// Normalized cellular metrics of one radio view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CellMetrics {
    pub signal_power_dbm: Option<i32>,
    pub snr_estimate: Option<i32>,
    pub cell_identity: Option<String>,
    pub frequency_channel: Option<String>,
}

impl CellMetrics {
    pub fn extract(view: &RadioView) -> Self {
        let serving = match view.serving_cell() {
            Ok(cell) => Some(cell),
            Err(e) => {
                debug!("No serving cell: {}", e);
                None
            }
        };

        let frequency_channel = match view.cells() {
            Ok(cells) => frequency_channel(cells),
            Err(e) => {
                debug!("No cell list for frequency channel: {}", e);
                None
            }
        };

        CellMetrics {
            signal_power_dbm: serving.and_then(signal_power),
            snr_estimate: serving.and_then(snr_estimate),
            cell_identity: serving.and_then(cell_identity),
            frequency_channel,
        }
    }
}

/// Reported power of an LTE serving cell.
pub fn signal_power(cell: &RawCellRecord) -> Option<i32> {
    match &cell.variant {
        CellVariant::Lte(lte) => lte.signal.dbm,
        CellVariant::Gsm(_) | CellVariant::Wcdma(_) | CellVariant::Nr(_) => None,
    }
}

/// Coarse SNR approximation for an LTE serving cell.
///
/// `|-rsrp - 10*log10(rssi)|`, rounded. This is not a standard SINR or CQI
/// measurement, and the absolute value drops the sign.
pub fn snr_estimate(cell: &RawCellRecord) -> Option<i32> {
    match &cell.variant {
        CellVariant::Lte(lte) => lte_snr(&lte.signal),
        CellVariant::Gsm(_) | CellVariant::Wcdma(_) | CellVariant::Nr(_) => None,
    }
}

fn lte_snr(signal: &LteSignal) -> Option<i32> {
    let rsrp = signal.rsrp?;
    let rssi = signal.rssi?;
    // log10 is undefined at and below zero
    if !rssi.is_finite() || rssi <= 0.0 {
        return None;
    }
    let rssi_db = 10.0 * rssi.log10();
    let snr = -f64::from(rsrp) - rssi_db;
    Some(snr.abs().round() as i32)
}

/// `<mcc>-<cell id>` for GSM, LTE and WCDMA cells.
pub fn cell_identity(cell: &RawCellRecord) -> Option<String> {
    let (mcc, cid) = match &cell.variant {
        CellVariant::Gsm(gsm) => (gsm.identity.mcc, gsm.identity.cid),
        CellVariant::Lte(lte) => (lte.identity.mcc, lte.identity.ci),
        CellVariant::Wcdma(wcdma) => (wcdma.identity.mcc, wcdma.identity.cid),
        CellVariant::Nr(_) => return None,
    };
    Some(format!("{}-{}", mcc?, cid?))
}

/// Channel number of the first handled record in the full list, which is
/// not necessarily the serving cell.
pub fn frequency_channel(cells: &[RawCellRecord]) -> Option<String> {
    cells.iter().find_map(|cell| {
        let channel = match &cell.variant {
            CellVariant::Gsm(gsm) => gsm.identity.arfcn,
            CellVariant::Wcdma(wcdma) => wcdma.identity.uarfcn,
            CellVariant::Lte(lte) => lte.identity.earfcn,
            CellVariant::Nr(_) => return None,
        };
        // The first handled record decides, even when it has no channel.
        Some(channel.map(|c| c.to_string()))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{PlatformCapabilities, PlatformLevel};
    use crate::radio::*;

    fn lte(registered: bool, rsrp: i32, rssi: f64) -> RawCellRecord {
        RawCellRecord {
            registered,
            variant: CellVariant::Lte(LteCell {
                identity: LteIdentity { mcc: Some(262), ci: Some(26703422), earfcn: Some(6300) },
                signal: LteSignal { dbm: Some(rsrp), rsrp: Some(rsrp), rssi: Some(rssi) },
            }),
        }
    }

    fn gsm(registered: bool) -> RawCellRecord {
        RawCellRecord {
            registered,
            variant: CellVariant::Gsm(GsmCell {
                identity: GsmIdentity { mcc: Some(310), cid: Some(1234), arfcn: Some(128) },
                signal: GsmSignal { dbm: Some(-75), bit_error_rate: Some(0) },
            }),
        }
    }

    fn wcdma(registered: bool) -> RawCellRecord {
        RawCellRecord {
            registered,
            variant: CellVariant::Wcdma(WcdmaCell {
                identity: WcdmaIdentity { mcc: Some(208), cid: Some(99), uarfcn: Some(10700) },
                signal: WcdmaSignal::default(),
            }),
        }
    }

    fn nr(registered: bool) -> RawCellRecord {
        RawCellRecord {
            registered,
            variant: CellVariant::Nr(NrCell {
                identity: NrIdentity { mcc: Some(310), nci: Some(7), nrarfcn: Some(520110) },
                signal: NrSignal { ss_rsrp: Some(-90), ss_sinr: Some(20) },
            }),
        }
    }

    fn view(cells: Vec<RawCellRecord>) -> RadioView {
        RadioView::new(
            RadioState {
                operator_name: "Op".into(),
                network_type: network_type::LTE,
                cells: Some(cells),
            },
            PlatformCapabilities::default(),
        )
    }

    #[test]
    fn test_lte_snr_estimate() {
        // |100 - 10*log10(158)| = |100 - 21.99| = 78
        assert_eq!(snr_estimate(&lte(true, -100, 158.0)), Some(78));
    }

    #[test]
    fn test_lte_snr_non_positive_rssi() {
        assert_eq!(snr_estimate(&lte(true, -100, 0.0)), None);
        assert_eq!(snr_estimate(&lte(true, -100, -3.0)), None);
        assert_eq!(snr_estimate(&lte(true, -100, f64::NAN)), None);
    }

    #[test]
    fn test_lte_full_metrics() {
        let metrics = CellMetrics::extract(&view(vec![lte(true, -100, 158.0)]));
        assert_eq!(
            metrics,
            CellMetrics {
                signal_power_dbm: Some(-100),
                snr_estimate: Some(78),
                cell_identity: Some("262-26703422".into()),
                frequency_channel: Some("6300".into()),
            }
        );
    }

    #[test]
    fn test_gsm_has_identity_but_no_power() {
        let metrics = CellMetrics::extract(&view(vec![gsm(true)]));
        assert_eq!(metrics.signal_power_dbm, None);
        assert_eq!(metrics.snr_estimate, None);
        assert_eq!(metrics.cell_identity.as_deref(), Some("310-1234"));
        assert_eq!(metrics.frequency_channel.as_deref(), Some("128"));
    }

    #[test]
    fn test_wcdma_identity_and_uarfcn() {
        let metrics = CellMetrics::extract(&view(vec![wcdma(true)]));
        assert_eq!(metrics.cell_identity.as_deref(), Some("208-99"));
        assert_eq!(metrics.frequency_channel.as_deref(), Some("10700"));
    }

    #[test]
    fn test_registered_nr_yields_nothing() {
        let metrics = CellMetrics::extract(&view(vec![nr(true)]));
        assert_eq!(metrics, CellMetrics::default());
    }

    #[test]
    fn test_frequency_comes_from_full_list() {
        // Neighbour GSM first, registered LTE second: identity follows the
        // serving cell, the channel follows list order.
        let metrics = CellMetrics::extract(&view(vec![nr(false), gsm(false), lte(true, -90, 100.0)]));
        assert_eq!(metrics.cell_identity.as_deref(), Some("262-26703422"));
        assert_eq!(metrics.frequency_channel.as_deref(), Some("128"));
    }

    #[test]
    fn test_no_registered_cell() {
        let metrics = CellMetrics::extract(&view(vec![gsm(false), lte(false, -90, 100.0)]));
        assert_eq!(metrics.signal_power_dbm, None);
        assert_eq!(metrics.snr_estimate, None);
        assert_eq!(metrics.cell_identity, None);
        assert_eq!(metrics.frequency_channel.as_deref(), Some("128"));
    }

    #[test]
    fn test_missing_identity_component() {
        let mut cell = gsm(true);
        if let CellVariant::Gsm(g) = &mut cell.variant {
            g.identity.mcc = None;
        }
        assert_eq!(cell_identity(&cell), None);
    }

    #[test]
    fn test_old_platform_only_gets_frequency() {
        let state = RadioState {
            cells: Some(vec![lte(true, -100, 158.0)]),
            ..Default::default()
        };
        let old = RadioView::new(state.clone(), PlatformCapabilities::for_level(PlatformLevel(20)));
        let metrics = CellMetrics::extract(&old);
        assert_eq!(metrics.signal_power_dbm, None);
        assert_eq!(metrics.frequency_channel.as_deref(), Some("6300"));

        let ancient = RadioView::new(state, PlatformCapabilities::for_level(PlatformLevel(16)));
        assert_eq!(CellMetrics::extract(&ancient), CellMetrics::default());
    }
}
