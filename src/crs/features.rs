//! Heuristic feature extraction for CRS ranking.
//!
//! Scans header lines in order and accumulates a structured feature
//! set. Merge policies differ on purpose and are easy to mis-port:
//! zone, datum and year are set-once slots (first plausible match
//! wins); hemisphere, units and region are set-always slots (a later
//! line overwrites). A second distinct datum mention appends an
//! ambiguity note instead of overwriting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::catalog::DatumFamily;

/// UTM hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    N,
    S,
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Hemisphere::N => "N",
            Hemisphere::S => "S",
        })
    }
}

/// Length unit mentioned in the text (or supplied as a side-channel
/// hint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft")]
    Feet,
}

/// Coarse region bucket used only for scoring priors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Europe,
    Na,
    MeIndia,
}

/// One detection, logged for diagnostics display only; scoring
/// recomputes everything from the structured fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedToken {
    pub token: String,
    pub weight: f64,
    /// 0-based index into the input lines (evidence line refs are
    /// 1-based; the two trails never mix)
    pub line_idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
}

impl MatchedToken {
    fn new(token: impl Into<String>, weight: f64, line_idx: usize) -> Self {
        Self {
            token: token.into(),
            weight,
            line_idx,
            span: None,
        }
    }

    fn with_span(token: impl Into<String>, weight: f64, line_idx: usize, span: (usize, usize)) -> Self {
        Self {
            token: token.into(),
            weight,
            line_idx,
            span: Some(span),
        }
    }
}

/// Structured features detected in the header text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub utm: bool,
    pub zone: Option<u8>,
    pub hemi: Option<Hemisphere>,
    pub datum: Option<DatumFamily>,
    pub units: Option<Units>,
    pub year: Option<i32>,
    pub region: Option<Region>,
    pub matched_keywords: Vec<MatchedToken>,
    pub notes: Vec<String>,
}

/// Alias spellings per canonical datum family.
pub static DATUM_ALIASES: &[(DatumFamily, &[&str])] = &[
    (
        DatumFamily::Wgs84,
        &["WGS84", "WGS 84", "WGS-84", "WORLD GEODETIC SYSTEM 1984"],
    ),
    (
        DatumFamily::Nad27,
        &["NAD27", "N.A.D. 27", "NAD 27", "NORTH AMERICAN DATUM 1927"],
    ),
    (
        DatumFamily::Nad83,
        &["NAD83", "N.A.D. 83", "NAD 83", "NORTH AMERICAN DATUM 1983"],
    ),
    (
        DatumFamily::Ed50,
        &["ED50", "EUROPEAN DATUM 1950", "ED 50", "ED-50"],
    ),
    (
        DatumFamily::Etrs89,
        &["ETRS89", "ETRF89", "ETRF2000", "ETRS 89", "ETRS-89"],
    ),
];

static UTM_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bUTM\b").unwrap(),
        Regex::new(r"UNIVERSAL\s+TRANSVERSE\s+MERCATOR").unwrap(),
    ]
});

static ZONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([1-9]|[1-5]\d|60)\s*([NS])?\b").unwrap());

static HEMI_N_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\bN\b", r"\bNORTH\b", r"\bNORTHERN\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static HEMI_S_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\bS\b", r"\bSOUTH\b", r"\bSOUTHERN\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static UNITS_M_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\bM\b", r"\bMETER\b", r"\bMETERS\b", r"\bMETRE\b", r"\bMETRES\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static UNITS_FT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\bFT\b", r"\bFEET\b", r"\bFOOT\b", r"US\s+SURVEY\s+FOOT"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

/// Region keyword buckets, checked in this priority order per line.
static EUROPE_HINTS: &[&str] = &[
    "NORTH SEA",
    "NORWAY",
    "UK",
    "UNITED KINGDOM",
    "GERMANY",
    "FRANCE",
    "NETHERLANDS",
    "DENMARK",
    "POLAND",
];
static NA_HINTS: &[&str] = &["GULF OF MEXICO", "USA", "UNITED STATES", "CANADA", "MEXICO"];
static ME_INDIA_HINTS: &[&str] = &["KUWAIT", "KSA", "SAUDI ARABIA", "UAE", "OMAN", "INDIA"];

/// Uppercase, collapse internal whitespace, trim ends.
fn normalize(s: &str) -> String {
    s.to_uppercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the feature set from raw header lines. Never fails; absence
/// of signal yields empty fields.
pub fn extract_features(lines: &[String]) -> ExtractedFeatures {
    let mut feats = ExtractedFeatures::default();

    for (idx, raw) in lines.iter().enumerate() {
        let line = normalize(raw);
        if line.is_empty() {
            continue;
        }

        // UTM keyword
        if UTM_RES.iter().any(|re| re.is_match(&line)) {
            feats.utm = true;
            feats
                .matched_keywords
                .push(MatchedToken::new("UTM", 2.0, idx));
        }

        // Zone + attached hemisphere. Zone is a set-once slot: the
        // first plausible zone wins for good. A hemisphere letter on
        // ANY zone match still updates hemi (set-always).
        for caps in ZONE_RE.captures_iter(&line) {
            let Ok(z) = caps[1].parse::<u8>() else { continue };
            if !(1..=60).contains(&z) {
                continue;
            }
            if feats.zone.is_none() {
                feats.zone = Some(z);
                let whole = caps.get(0).unwrap();
                let hemi_ch = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                feats.matched_keywords.push(MatchedToken::with_span(
                    format!("ZONE {z}{hemi_ch}"),
                    3.0,
                    idx,
                    (whole.start(), whole.end()),
                ));
            }
            if let Some(h) = caps.get(2) {
                feats.hemi = Some(if h.as_str() == "N" {
                    Hemisphere::N
                } else {
                    Hemisphere::S
                });
            }
        }

        // Standalone hemisphere words (set-always)
        if HEMI_N_RES.iter().any(|re| re.is_match(&line)) {
            feats.hemi = Some(Hemisphere::N);
            feats
                .matched_keywords
                .push(MatchedToken::new("HEMI N", 1.0, idx));
        }
        if HEMI_S_RES.iter().any(|re| re.is_match(&line)) {
            feats.hemi = Some(Hemisphere::S);
            feats
                .matched_keywords
                .push(MatchedToken::new("HEMI S", 1.0, idx));
        }

        // Datum aliases. Datum is a set-once slot; a different datum
        // later appends an ambiguity note instead of overwriting.
        for (canon, aliases) in DATUM_ALIASES {
            for alias in *aliases {
                if line.contains(alias) {
                    if let Some(existing) = feats.datum {
                        if existing != *canon {
                            feats.notes.push(format!(
                                "Multiple datums mentioned: {existing} and {canon}"
                            ));
                        }
                    } else {
                        feats.datum = Some(*canon);
                    }
                    feats
                        .matched_keywords
                        .push(MatchedToken::new(canon.as_str(), 4.0, idx));
                    break;
                }
            }
        }

        // Units (set-always; feet on a later line overrides meters)
        if UNITS_M_RES.iter().any(|re| re.is_match(&line)) {
            feats.units = Some(Units::Meters);
            feats
                .matched_keywords
                .push(MatchedToken::new("UNITS M", 0.5, idx));
        }
        if UNITS_FT_RES.iter().any(|re| re.is_match(&line)) {
            feats.units = Some(Units::Feet);
            feats
                .matched_keywords
                .push(MatchedToken::new("UNITS FT", -2.0, idx));
        }

        // Vintage year (set-once)
        if feats.year.is_none() {
            if let Some(caps) = YEAR_RE.captures(&line) {
                let whole = caps.get(1).unwrap();
                if let Ok(y) = whole.as_str().parse::<i32>() {
                    feats.year = Some(y);
                    feats.matched_keywords.push(MatchedToken::with_span(
                        format!("YEAR {y}"),
                        0.5,
                        idx,
                        (whole.start(), whole.end()),
                    ));
                }
            }
        }

        // Region hints: first matching bucket per line, later lines
        // may overwrite (set-always across lines)
        if EUROPE_HINTS.iter().any(|h| line.contains(h)) {
            feats.region = Some(Region::Europe);
            feats
                .matched_keywords
                .push(MatchedToken::new("REGION EUROPE", 0.5, idx));
        } else if NA_HINTS.iter().any(|h| line.contains(h)) {
            feats.region = Some(Region::Na);
            feats
                .matched_keywords
                .push(MatchedToken::new("REGION NA", 0.5, idx));
        } else if ME_INDIA_HINTS.iter().any(|h| line.contains(h)) {
            feats.region = Some(Region::MeIndia);
            feats
                .matched_keywords
                .push(MatchedToken::new("REGION ME_INDIA", 0.5, idx));
        }
    }

    feats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_utm_zone_hemisphere_datum() {
        let feats = extract_features(&lines(&["UTM 32N WGS84"]));
        assert!(feats.utm);
        assert_eq!(feats.zone, Some(32));
        assert_eq!(feats.hemi, Some(Hemisphere::N));
        assert_eq!(feats.datum, Some(DatumFamily::Wgs84));
    }

    // The asymmetry below is preserved observed behavior, not an
    // accident of this port: zone is set-once, hemisphere set-always.
    #[test]
    fn zone_is_first_write_hemisphere_is_last_write() {
        let feats = extract_features(&lines(&["ZONE 15N", "ZONE 22S"]));
        assert_eq!(feats.zone, Some(15));
        assert_eq!(feats.hemi, Some(Hemisphere::S));
    }

    #[test]
    fn standalone_hemisphere_words_update_hemi() {
        let feats = extract_features(&lines(&["SOUTHERN BLOCK"]));
        assert_eq!(feats.hemi, Some(Hemisphere::S));
        assert_eq!(feats.zone, None);
    }

    #[test]
    fn second_datum_appends_note_without_overwrite() {
        let feats = extract_features(&lines(&["DATUM WGS84", "ALSO SEEN: ED50"]));
        assert_eq!(feats.datum, Some(DatumFamily::Wgs84));
        assert_eq!(feats.notes.len(), 1);
        assert!(feats.notes[0].contains("WGS84"));
        assert!(feats.notes[0].contains("ED50"));
        // second alias still logs a token
        assert!(feats.matched_keywords.iter().any(|t| t.token == "ED50"));
    }

    #[test]
    fn units_are_last_write_wins() {
        let feats = extract_features(&lines(&["COORDS IN METERS", "ELEVATIONS IN FEET"]));
        assert_eq!(feats.units, Some(Units::Feet));
    }

    #[test]
    fn year_is_first_write_wins_and_gated() {
        let feats = extract_features(&lines(&["ACQUIRED 1987", "REPROCESSED 2004"]));
        assert_eq!(feats.year, Some(1987));

        let feats = extract_features(&lines(&["LINE 1850"]));
        assert_eq!(feats.year, None);
    }

    #[test]
    fn region_buckets_check_in_priority_order() {
        let feats = extract_features(&lines(&["NORTH SEA SURVEY FOR USA CLIENT"]));
        assert_eq!(feats.region, Some(Region::Europe));

        // later line overwrites
        let feats = extract_features(&lines(&["NORTH SEA", "GULF OF MEXICO"]));
        assert_eq!(feats.region, Some(Region::Na));
    }

    #[test]
    fn datum_digits_do_not_leak_into_zone() {
        // "84" in WGS84 has no word boundary; the zone slot stays empty
        let feats = extract_features(&lines(&["DATUM: WGS84"]));
        assert_eq!(feats.zone, None);
    }

    #[test]
    fn empty_input_yields_default_features() {
        assert_eq!(extract_features(&[]), ExtractedFeatures::default());
    }
}
