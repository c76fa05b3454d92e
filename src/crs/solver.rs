//! CRS candidate generation, scoring and ranking.
//!
//! Candidates are (datum family, zone, hemisphere) triples enumerated
//! from the extracted features; each gets a weighted score with a
//! human-readable reason per triggered rule, and the scores are
//! normalized to probabilities by softmax.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::CrsConfig;

use super::catalog::{utm_label, utm_registry_code, DatumFamily};
use super::diagnostics::{pack_matched, Diagnostics, Penalty};
use super::features::{extract_features, ExtractedFeatures, Hemisphere, Region, Units};

/// One generated hypothesis, ephemeral to a single scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub epsg: u32,
    pub label: String,
    pub family: DatumFamily,
    pub zone: u8,
    pub hemi: Hemisphere,
}

/// A scored candidate in output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub epsg: u32,
    pub label: String,
    /// Probability, rounded to 4 places
    pub p: f64,
    pub reasons: Vec<String>,
}

/// Ranked candidates plus the diagnostics accumulated while scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsResolution {
    pub candidates: Vec<RankedCandidate>,
    pub diagnostics: Diagnostics,
    pub version: String,
}

/// Softmax with max-subtraction; degenerate sums fall back to uniform.
pub fn softmax(xs: &[f64], temperature: f64) -> Vec<f64> {
    if xs.is_empty() {
        return Vec::new();
    }
    let mx = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let t = temperature.max(1e-6);
    let exps: Vec<f64> = xs.iter().map(|x| ((x - mx) / t).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return vec![1.0 / xs.len() as f64; xs.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

/// Vintage/region prior for one datum family. Fixed rule tables, not
/// learned.
fn vintage_prior(
    family: DatumFamily,
    year: Option<i32>,
    region: Option<Region>,
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    if let Some(year) = year {
        if year <= 1975 {
            if family == DatumFamily::Nad27 {
                score += 2.0;
                reasons.push("vintage<=1975 favors NAD27".to_string());
            }
            if family == DatumFamily::Wgs84 {
                score -= 2.0;
                reasons.push("vintage<=1975 penalizes WGS84".to_string());
            }
        } else if (1976..=1990).contains(&year) {
            if matches!(family, DatumFamily::Nad83 | DatumFamily::Ed50) {
                score += 1.0;
                reasons.push("1976-1990 favors NAD83/ED50".to_string());
            }
        } else {
            if matches!(family, DatumFamily::Wgs84 | DatumFamily::Etrs89) {
                score += 2.0;
                reasons.push(">=1991 favors WGS84/ETRS89".to_string());
            }
            if family == DatumFamily::Nad27 {
                score -= 2.0;
                reasons.push(">=1991 penalizes NAD27".to_string());
            }
        }
    }

    match region {
        Some(Region::Na) if family == DatumFamily::Nad83 => {
            score += 1.0;
            reasons.push("region NA favors NAD83".to_string());
        }
        Some(Region::Europe) if matches!(family, DatumFamily::Etrs89 | DatumFamily::Ed50) => {
            score += 1.0;
            reasons.push("region Europe favors ETRS89/ED50".to_string());
        }
        Some(Region::MeIndia) if family == DatumFamily::Wgs84 => {
            score += 1.0;
            reasons.push("region ME/India favors WGS84".to_string());
        }
        _ => {}
    }

    (score, reasons)
}

/// Enumerate UTM candidates across datum families.
///
/// Detected zone or the configured fallback; detected hemisphere alone
/// or both; a detected datum family is ordered first (ordering hint
/// only, never affects scoring). Families without a base for the
/// requested hemisphere simply produce no row.
pub fn generate_candidates(feats: &ExtractedFeatures, cfg: &CrsConfig) -> Vec<Candidate> {
    let zone = feats.zone.unwrap_or(cfg.fallback_zone);
    let hemi_options: Vec<Hemisphere> = match feats.hemi {
        Some(h) => vec![h],
        None => vec![Hemisphere::N, Hemisphere::S],
    };

    let mut families: Vec<DatumFamily> = DatumFamily::ALL.to_vec();
    if let Some(detected) = feats.datum {
        families.retain(|f| *f != detected);
        families.insert(0, detected);
    }

    let mut candidates = Vec::new();
    for family in families {
        for &hemi in &hemi_options {
            let Some(epsg) = utm_registry_code(family, zone, hemi) else {
                continue;
            };
            candidates.push(Candidate {
                epsg,
                label: utm_label(family, zone, hemi),
                family,
                zone,
                hemi,
            });
        }
    }
    candidates
}

/// Rank CRS hypotheses for the given header lines.
///
/// `units_hint` is an optional side-channel override (e.g. from trace
/// statistics) that takes priority over text-detected units.
#[instrument(skip_all, fields(lines = lines.len()))]
pub fn solve(lines: &[String], units_hint: Option<Units>, cfg: &CrsConfig) -> CrsResolution {
    let feats = extract_features(lines);
    solve_features(&feats, units_hint, cfg)
}

/// Scoring pass over already-extracted features.
pub fn solve_features(
    feats: &ExtractedFeatures,
    units_hint: Option<Units>,
    cfg: &CrsConfig,
) -> CrsResolution {
    let w = &cfg.weights;
    let mut diagnostics = Diagnostics {
        matched_keywords: pack_matched(&feats.matched_keywords),
        conflicts: Vec::new(),
        penalties: Vec::new(),
        notes: feats.notes.clone(),
    };

    let candidates = generate_candidates(feats, cfg);

    // Feature-level ambiguity penalties apply to every candidate and
    // are recorded once in the shared diagnostics.
    let no_datum = feats.zone.is_some() && feats.datum.is_none();
    let ambig_datum = feats.notes.iter().any(|n| n.contains("Multiple datums"));
    if no_datum {
        diagnostics.penalties.push(Penalty {
            reason: "zone present but no datum".to_string(),
            delta: w.no_datum,
        });
    }
    if ambig_datum {
        diagnostics.conflicts.push("datum ambiguity".to_string());
        diagnostics.penalties.push(Penalty {
            reason: "multiple datums".to_string(),
            delta: w.ambig_datum,
        });
    }

    // Side-channel units beat text-detected units
    let units = units_hint.or(feats.units);
    if units == Some(Units::Feet) {
        diagnostics.conflicts.push("feet with UTM".to_string());
        diagnostics.penalties.push(Penalty {
            reason: "feet with UTM".to_string(),
            delta: w.units_ft,
        });
    }

    let mut scores = Vec::with_capacity(candidates.len());
    let mut reason_lists = Vec::with_capacity(candidates.len());

    for c in &candidates {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if feats.utm {
            score += w.utm;
            reasons.push("found 'UTM'".to_string());
        }
        if let Some(zone) = feats.zone {
            if c.zone == zone {
                score += w.zone;
                reasons.push(format!("zone {zone}"));
            }
        }
        if feats.datum == Some(c.family) {
            score += w.datum;
            reasons.push(format!("datum '{}'", c.family));
        }
        if let Some(hemi) = feats.hemi {
            if c.hemi == hemi {
                score += w.hemi;
                reasons.push(format!("hemisphere '{hemi}'"));
            }
        }
        match units {
            Some(Units::Meters) => {
                score += w.units_m;
                reasons.push("meters unit".to_string());
            }
            Some(Units::Feet) => {
                score += w.units_ft;
            }
            None => {}
        }

        // Global ambiguity penalties
        if no_datum {
            score += w.no_datum;
        }
        if ambig_datum {
            score += w.ambig_datum;
        }

        let (prior, prior_reasons) = vintage_prior(c.family, feats.year, feats.region);
        score += prior;
        reasons.extend(prior_reasons);

        scores.push(score);
        reason_lists.push(reasons);
    }

    let probs = softmax(&scores, cfg.temperature);

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .zip(reason_lists)
        .zip(probs)
        .map(|((c, reasons), p)| RankedCandidate {
            epsg: c.epsg,
            label: c.label.clone(),
            p: (p * 10_000.0).round() / 10_000.0,
            reasons,
        })
        .collect();

    // stable sort keeps generation order among equal probabilities
    ranked.sort_by(|a, b| b.p.partial_cmp(&a.p).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(top) = ranked.first() {
        debug!(epsg = top.epsg, p = top.p, "top candidate");
        if top.p < cfg.ambiguity_threshold {
            diagnostics
                .notes
                .push("ambiguous; consider manual confirm".to_string());
        }
    }
    ranked.truncate(cfg.top_n);

    CrsResolution {
        candidates: ranked,
        diagnostics,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
