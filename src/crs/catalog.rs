//! Minimal programmatic registry catalog.
//!
//! Just the datum families we rank and the arithmetic that turns a
//! (family, zone, hemisphere) triple into an EPSG code. North-only
//! families have no southern base and yield no candidate for S.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Hemisphere;

/// Geodetic datum families with projected UTM code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatumFamily {
    #[serde(rename = "WGS84")]
    Wgs84,
    #[serde(rename = "NAD83")]
    Nad83,
    #[serde(rename = "NAD27")]
    Nad27,
    #[serde(rename = "ED50")]
    Ed50,
    #[serde(rename = "ETRS89")]
    Etrs89,
}

impl DatumFamily {
    /// Catalog order; also the candidate generation order when no
    /// datum was detected.
    pub const ALL: [DatumFamily; 5] = [
        DatumFamily::Wgs84,
        DatumFamily::Nad83,
        DatumFamily::Nad27,
        DatumFamily::Ed50,
        DatumFamily::Etrs89,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatumFamily::Wgs84 => "WGS84",
            DatumFamily::Nad83 => "NAD83",
            DatumFamily::Nad27 => "NAD27",
            DatumFamily::Ed50 => "ED50",
            DatumFamily::Etrs89 => "ETRS89",
        }
    }

    /// EPSG base code for northern-hemisphere UTM zones.
    fn north_base(&self) -> u32 {
        match self {
            DatumFamily::Wgs84 => 32600,
            DatumFamily::Nad83 => 26900,
            DatumFamily::Nad27 => 26700,
            DatumFamily::Ed50 => 23000,
            DatumFamily::Etrs89 => 25800,
        }
    }

    /// EPSG base code for southern-hemisphere UTM zones; only WGS84
    /// defines one.
    fn south_base(&self) -> Option<u32> {
        match self {
            DatumFamily::Wgs84 => Some(32700),
            _ => None,
        }
    }
}

impl fmt::Display for DatumFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EPSG code for a UTM zone of a datum family; `None` when the family
/// has no base for the requested hemisphere.
pub fn utm_registry_code(family: DatumFamily, zone: u8, hemi: Hemisphere) -> Option<u32> {
    let base = match hemi {
        Hemisphere::N => Some(family.north_base()),
        Hemisphere::S => family.south_base(),
    }?;
    Some(base + zone as u32)
}

/// Human-readable candidate label, e.g. "WGS84 / UTM zone 32N".
pub fn utm_label(family: DatumFamily, zone: u8, hemi: Hemisphere) -> String {
    format!("{family} / UTM zone {zone}{hemi}")
}
