/*!
Cell-record and radio-state fixtures

Values are taken from real captures: an LTE cell on Telekom.de (mcc 262), a
GSM cell in the US (mcc 310), a WCDMA cell in France (mcc 208).
*/

use chrono::{DateTime, Local, TimeZone};
use netprobe_core::radio::{
    network_type, CellVariant, GsmCell, GsmIdentity, GsmSignal, LteCell, LteIdentity, LteSignal,
    NrCell, NrIdentity, NrSignal, RadioState, RawCellRecord, WcdmaCell, WcdmaIdentity, WcdmaSignal,
};

pub const LTE_MCC: u16 = 262;
pub const LTE_CI: u64 = 26703422;
pub const LTE_EARFCN: u32 = 6300;

pub fn lte(registered: bool) -> RawCellRecord {
    lte_with_signal(registered, -100, 158.0)
}

pub fn lte_with_signal(registered: bool, rsrp: i32, rssi: f64) -> RawCellRecord {
    RawCellRecord {
        registered,
        variant: CellVariant::Lte(LteCell {
            identity: LteIdentity {
                mcc: Some(LTE_MCC),
                ci: Some(LTE_CI),
                earfcn: Some(LTE_EARFCN),
            },
            signal: LteSignal {
                dbm: Some(rsrp),
                rsrp: Some(rsrp),
                rssi: Some(rssi),
            },
        }),
    }
}

pub fn gsm(registered: bool) -> RawCellRecord {
    RawCellRecord {
        registered,
        variant: CellVariant::Gsm(GsmCell {
            identity: GsmIdentity {
                mcc: Some(310),
                cid: Some(1234),
                arfcn: Some(128),
            },
            signal: GsmSignal {
                dbm: Some(-75),
                bit_error_rate: Some(0),
            },
        }),
    }
}

pub fn wcdma(registered: bool) -> RawCellRecord {
    RawCellRecord {
        registered,
        variant: CellVariant::Wcdma(WcdmaCell {
            identity: WcdmaIdentity {
                mcc: Some(208),
                cid: Some(99),
                uarfcn: Some(10700),
            },
            signal: WcdmaSignal {
                dbm: Some(-85),
                ecno: Some(-6),
            },
        }),
    }
}

pub fn nr(registered: bool) -> RawCellRecord {
    RawCellRecord {
        registered,
        variant: CellVariant::Nr(NrCell {
            identity: NrIdentity {
                mcc: Some(310),
                nci: Some(7),
                nrarfcn: Some(520110),
            },
            signal: NrSignal {
                ss_rsrp: Some(-90),
                ss_sinr: Some(20),
            },
        }),
    }
}

pub fn radio_state(operator: &str, code: i32, cells: Vec<RawCellRecord>) -> RadioState {
    RadioState {
        operator_name: operator.to_string(),
        network_type: code,
        cells: Some(cells),
    }
}

/// Registered LTE cell on a 4G network.
pub fn lte_state() -> RadioState {
    radio_state("Telekom.de", network_type::LTE, vec![lte(true)])
}

/// 07 Mar 2024 03:04 PM, local time.
pub fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 3, 7, 15, 4, 0)
        .single()
        .expect("unambiguous fixture time")
}
