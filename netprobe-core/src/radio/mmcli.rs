//! Radio state from ModemManager (`mmcli`) on Linux hosts
//!
//! ModemManager only describes the serving cell, so the produced state holds
//! at most one record, flagged registered. Channel numbers are not exposed
//! by `mmcli` and stay unreported.

use super::{
    network_type, CellVariant, GsmCell, GsmIdentity, GsmSignal, LteCell, LteIdentity, LteSignal,
    NrCell, NrIdentity, NrSignal, RadioInfoSource, RadioState, RawCellRecord, WcdmaCell,
    WcdmaIdentity, WcdmaSignal,
};
use crate::error::TelemetryError;
use serde_json::Value;
use std::process::Command;
use tracing::{debug, warn};

/// Queries the first (or a configured) modem through `mmcli`.
#[derive(Debug, Clone, Default)]
pub struct ModemManagerSource {
    modem_id: Option<String>,
}

impl ModemManagerSource {
    pub fn new(modem_id: Option<String>) -> Self {
        Self { modem_id }
    }

    fn modem_id(&self) -> Result<String, TelemetryError> {
        if let Some(id) = &self.modem_id {
            return Ok(id.clone());
        }
        let output = run_cmd("mmcli", &["-L"])?;
        parse_modem_list(&output)
            .ok_or_else(|| TelemetryError::SourceUnavailable("no modem found".into()))
    }
}

impl RadioInfoSource for ModemManagerSource {
    fn query(&self) -> Result<RadioState, TelemetryError> {
        let modem_id = self.modem_id()?;
        debug!("Querying modem {} through mmcli", modem_id);

        let info = run_cmd("mmcli", &["-m", &modem_id, "-J"])?;
        let info = parse_modem_info(&info)?;

        // Location and signal are optional extras: a modem without location
        // support still yields operator and network type.
        let location = run_cmd("mmcli", &["-m", &modem_id, "--location-get", "--output-json"])
            .and_then(|out| parse_location(&out))
            .unwrap_or_else(|e| {
                warn!("mmcli location unavailable: {}", e);
                GppLocation::default()
            });
        let signal = run_cmd("mmcli", &["-m", &modem_id, "--signal-get", "--output-json"])
            .and_then(|out| parse_signal(&out))
            .unwrap_or_else(|e| {
                warn!("mmcli signal unavailable: {}", e);
                SignalReadings::default()
            });

        Ok(build_state(info, location, signal))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ModemInfo {
    operator_name: Option<String>,
    access_tech: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct GppLocation {
    mcc: Option<u16>,
    cid: Option<u64>,
}

/// dBm readings; `None` where mmcli printed "--".
#[derive(Debug, Clone, Default, PartialEq)]
struct SignalReadings {
    lte_rsrp: Option<f64>,
    lte_rssi: Option<f64>,
    umts_rscp: Option<f64>,
    umts_rssi: Option<f64>,
    gsm_rssi: Option<f64>,
    nr_rsrp: Option<f64>,
    nr_snr: Option<f64>,
}

fn run_cmd(cmd: &str, args: &[&str]) -> Result<String, TelemetryError> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|e| TelemetryError::query(cmd, e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let err = String::from_utf8_lossy(&output.stderr);
        Err(TelemetryError::TransientQueryFailure(format!(
            "{cmd} {} failed: {}",
            args.join(" "),
            err.trim()
        )))
    }
}

fn parse_modem_list(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|token| token.contains("/Modem/"))
        .and_then(|path| path.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

fn parse_json(output: &str) -> Result<Value, TelemetryError> {
    serde_json::from_str(output).map_err(|e| TelemetryError::MalformedInput(e.to_string()))
}

/// mmcli prints "--" for values it does not have.
fn reported(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty() && *s != "--")
}

fn parse_modem_info(output: &str) -> Result<ModemInfo, TelemetryError> {
    let json = parse_json(output)?;
    let operator_name = reported(&json["modem"]["3gpp"]["operator-name"]).map(str::to_string);
    let access_tech = json["modem"]["generic"]["access-technologies"]
        .as_array()
        .and_then(|a| a.first())
        .and_then(reported)
        .map(|s| s.to_ascii_lowercase());

    Ok(ModemInfo { operator_name, access_tech })
}

fn parse_location(output: &str) -> Result<GppLocation, TelemetryError> {
    let json = parse_json(output)?;
    let gpp = &json["modem"]["location"]["3gpp"];
    let mcc = reported(&gpp["mcc"]).and_then(|s| s.parse().ok());
    // Cell ids are printed in hex
    let cid = reported(&gpp["cid"]).and_then(|s| u64::from_str_radix(s, 16).ok());

    Ok(GppLocation { mcc, cid })
}

fn parse_signal(output: &str) -> Result<SignalReadings, TelemetryError> {
    let json = parse_json(output)?;
    let signal = &json["modem"]["signal"];
    let get = |tech: &str, field: &str| reported(&signal[tech][field]).and_then(|s| s.parse().ok());

    Ok(SignalReadings {
        lte_rsrp: get("lte", "rsrp"),
        lte_rssi: get("lte", "rssi"),
        umts_rscp: get("umts", "rscp"),
        umts_rssi: get("umts", "rssi"),
        gsm_rssi: get("gsm", "rssi"),
        nr_rsrp: get("5g", "rsrp"),
        nr_snr: get("5g", "snr"),
    })
}

/// Map a ModemManager access-technology nick to the platform network-type code.
fn network_type_for(access_tech: &str) -> i32 {
    match access_tech {
        "gsm" | "gsm-compact" => network_type::GSM,
        "gprs" => network_type::GPRS,
        "edge" => network_type::EDGE,
        "umts" => network_type::UMTS,
        "hsdpa" => network_type::HSDPA,
        "hsupa" => network_type::HSUPA,
        "hspa" => network_type::HSPA,
        "hspa-plus" => network_type::HSPAP,
        "1xrtt" => network_type::ONE_X_RTT,
        "evdo0" => network_type::EVDO_0,
        "evdoa" => network_type::EVDO_A,
        "evdob" => network_type::EVDO_B,
        "lte" => network_type::LTE,
        "5gnr" => network_type::NR,
        _ => network_type::UNKNOWN,
    }
}

fn dbm(value: Option<f64>) -> Option<i32> {
    value.map(|v| v.round() as i32)
}

/// dBm to milliwatts, the linear scale the extractor expects.
fn dbm_to_linear(value: Option<f64>) -> Option<f64> {
    value.map(|v| 10f64.powf(v / 10.0))
}

fn build_state(info: ModemInfo, location: GppLocation, signal: SignalReadings) -> RadioState {
    let code = info.access_tech.as_deref().map(network_type_for).unwrap_or(network_type::UNKNOWN);
    let GppLocation { mcc, cid } = location;

    let variant = match code {
        network_type::GSM | network_type::GPRS | network_type::EDGE => Some(CellVariant::Gsm(GsmCell {
            identity: GsmIdentity { mcc, cid, arfcn: None },
            signal: GsmSignal { dbm: dbm(signal.gsm_rssi), bit_error_rate: None },
        })),
        network_type::UMTS
        | network_type::HSDPA
        | network_type::HSUPA
        | network_type::HSPA
        | network_type::HSPAP => Some(CellVariant::Wcdma(WcdmaCell {
            identity: WcdmaIdentity { mcc, cid, uarfcn: None },
            signal: WcdmaSignal { dbm: dbm(signal.umts_rscp.or(signal.umts_rssi)), ecno: None },
        })),
        network_type::LTE => Some(CellVariant::Lte(LteCell {
            identity: LteIdentity { mcc, ci: cid, earfcn: None },
            signal: LteSignal {
                dbm: dbm(signal.lte_rsrp),
                rsrp: dbm(signal.lte_rsrp),
                rssi: dbm_to_linear(signal.lte_rssi),
            },
        })),
        network_type::NR => Some(CellVariant::Nr(NrCell {
            identity: NrIdentity { mcc, nci: cid, nrarfcn: None },
            signal: NrSignal { ss_rsrp: dbm(signal.nr_rsrp), ss_sinr: dbm(signal.nr_snr) },
        })),
        _ => None,
    };

    RadioState {
        operator_name: info.operator_name.unwrap_or_default(),
        network_type: code,
        cells: Some(
            variant
                .map(|variant| vec![RawCellRecord { registered: true, variant }])
                .unwrap_or_default(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEM_INFO: &str = r#"{"modem":{"3gpp":{"imei":"353338976168895","operator-code":"26202","operator-name":"vodafone.de","registration-state":"roaming"},"generic":{"access-technologies":["lte"],"state":"connected"}}}"#;

    const LOCATION: &str = r#"{
        "modem": {
            "location": {
                "3gpp": { "cid": "0197763E", "lac": "0000", "mcc": "262", "mnc": "03", "tac": "00C945" },
                "gps": { "altitude": "--", "latitude": "--", "longitude": "--", "nmea": [], "utc": "--" }
            }
        }
    }"#;

    const SIGNAL: &str = r#"{
        "modem": {
            "signal": {
                "5g": { "rsrp": "--", "rsrq": "--", "snr": "--" },
                "gsm": { "rssi": "--" },
                "lte": { "rsrp": "-97.00", "rsrq": "-9.00", "rssi": "-65.00", "snr": "12.40", "error-rate": "--" },
                "umts": { "ecio": "--", "rscp": "--", "rssi": "--" }
            }
        }
    }"#;

    #[test]
    fn test_parse_modem_list() {
        let list = "Found 1 modems:
        /org/freedesktop/ModemManager1/Modem/0 [Telit] LE910C4-WWXD";
        assert_eq!(parse_modem_list(list).as_deref(), Some("0"));

        let bare = "    /org/freedesktop/ModemManager1/Modem/9 [Telit] LE910C4-WWXD";
        assert_eq!(parse_modem_list(bare).as_deref(), Some("9"));

        assert_eq!(parse_modem_list("No modems were found"), None);
    }

    #[test]
    fn test_parse_modem_info() {
        let info = parse_modem_info(MODEM_INFO).unwrap();
        assert_eq!(info.operator_name.as_deref(), Some("vodafone.de"));
        assert_eq!(info.access_tech.as_deref(), Some("lte"));
    }

    #[test]
    fn test_parse_location_hex_cid() {
        let loc = parse_location(LOCATION).unwrap();
        assert_eq!(loc.mcc, Some(262));
        assert_eq!(loc.cid, Some(0x0197763E));
    }

    #[test]
    fn test_parse_signal_skips_dashes() {
        let signal = parse_signal(SIGNAL).unwrap();
        assert_eq!(signal.lte_rsrp, Some(-97.0));
        assert_eq!(signal.lte_rssi, Some(-65.0));
        assert_eq!(signal.gsm_rssi, None);
        assert_eq!(signal.nr_rsrp, None);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(
            parse_signal("not json"),
            Err(TelemetryError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_build_state_lte() {
        let state = build_state(
            parse_modem_info(MODEM_INFO).unwrap(),
            parse_location(LOCATION).unwrap(),
            parse_signal(SIGNAL).unwrap(),
        );
        assert_eq!(state.operator_name, "vodafone.de");
        assert_eq!(state.network_type, network_type::LTE);

        let cells = state.cells.unwrap();
        assert_eq!(cells.len(), 1);
        assert!(cells[0].registered);
        match &cells[0].variant {
            CellVariant::Lte(lte) => {
                assert_eq!(lte.identity.mcc, Some(262));
                assert_eq!(lte.identity.ci, Some(26703422));
                assert_eq!(lte.signal.rsrp, Some(-97));
                let rssi = lte.signal.rssi.unwrap();
                assert!((10.0 * rssi.log10() - -65.0).abs() < 1e-9);
            }
            other => panic!("expected LTE, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_access_tech_has_no_cell() {
        let info = ModemInfo {
            operator_name: None,
            access_tech: Some("lte-nb-iot".into()),
        };
        let state = build_state(info, GppLocation::default(), SignalReadings::default());
        assert_eq!(state.network_type, network_type::UNKNOWN);
        assert_eq!(state.cells, Some(vec![]));
        assert_eq!(state.operator_name, "");
    }

    #[test]
    fn test_access_tech_mapping() {
        assert_eq!(network_type_for("edge"), network_type::EDGE);
        assert_eq!(network_type_for("hspa-plus"), network_type::HSPAP);
        assert_eq!(network_type_for("5gnr"), network_type::NR);
        assert_eq!(network_type_for("gsm"), network_type::GSM);
    }
}
