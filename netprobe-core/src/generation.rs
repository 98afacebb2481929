//! Network generation classification
//!
//! A fixed partition of the platform network-type codes. Codes outside the
//! three known buckets, 5G NR included, are reported as "Unknown".

use crate::radio::network_type::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generation {
    #[serde(rename = "2G")]
    TwoG,
    #[serde(rename = "3G")]
    ThreeG,
    #[serde(rename = "4G")]
    FourG,
    Unknown,
}

impl Generation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::TwoG => "2G",
            Generation::ThreeG => "3G",
            Generation::FourG => "4G",
            Generation::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw network-type code.
pub fn classify(code: i32) -> Generation {
    match code {
        GPRS | EDGE | CDMA | ONE_X_RTT | IDEN => Generation::TwoG,
        UMTS | EVDO_0 | EVDO_A | HSDPA | HSUPA | HSPA | EVDO_B | EHRPD | HSPAP => {
            Generation::ThreeG
        }
        LTE => Generation::FourG,
        _ => Generation::Unknown,
    }
}
