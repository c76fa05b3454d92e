//! Deterministic pattern extraction from header text.
//!
//! A lookup table of textual conventions seen in real survey headers.
//! Produces the deterministic field map consumed by the arbiter; every
//! evidence carries 1-based line refs and, where a low-level matcher
//! reported one, the matched span.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::evidence::{Evidence, FieldMap, FieldValue, HeaderField};

use super::values::{
    match_aux_traces_per_record, match_bytes_per_sample, match_data_traces_per_record,
    match_format_this_reel, match_sample_interval_ms, match_samples_per_trace,
};

static SAMPLE_INTERVAL_UNITS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)SAMPLE\s+INTER\w*\s*[:=]?\s*([0-9,._ ]*\.?[0-9]+)\s*(MSEC|MILLISECONDS?|MS|USEC|MICROSECONDS?|US|µS|S|SEC|SECONDS?)\b",
    )
    .unwrap()
});

static SAMPLE_INTERVAL_BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)SAMPLE\s+INTER\w*\s*[:=]?\s*([0-9,._ ]*\.?[0-9]+)(?:\s|$)").unwrap()
});

static RECORD_LENGTH_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?i)RECORD\s+LENGTH\s*[:=]?\s*([0-9,._ ]*\.?[0-9]+)\s*(MSEC|MILLISECONDS?|MS|S|SEC|SECONDS?)\b",
        )
        .unwrap(),
        Regex::new(
            r"(?i)RLEN(?:GTH)?\s*[:=]?\s*([0-9,._ ]*\.?[0-9]+)\s*(MSEC|MILLISECONDS?|MS|S|SEC|SECONDS?)\b",
        )
        .unwrap(),
    ]
});

static TRACES_PER_RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:DATA\s+)?TRACES?\s*/\s*RECORDS?\s*[:=]?\s*(\d+)").unwrap()
});

static COMPANY_RE: Lazy<Regex> = Lazy::new(|| free_text_re("COMPANY"));
static CLIENT_RE: Lazy<Regex> = Lazy::new(|| free_text_re("CLIENT"));
static AREA_RE: Lazy<Regex> = Lazy::new(|| free_text_re("AREA"));
static CONTRACTOR_RE: Lazy<Regex> = Lazy::new(|| free_text_re("CONTRACTOR"));

static PROJECT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PROJECT\s+NAME\s*[:=]?\s*(.+?)(?:\s{2,}|$)").unwrap());

static DATE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDATE\s*[:=]?\s*(\d{4})\b").unwrap());

static RECORDING_FORMAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(RECORDING\s+FORMAT|FORMAT\s+THIS\s+REEL)\s*[:=]?\s*([A-Za-z0-9\-_/\. ]+)")
        .unwrap()
});

static MEASUREMENT_SYSTEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)MEASUREMENT\s+SYSTEM\s*[:=]?\s*([A-Z]+)").unwrap());

static ENDIAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(LITTLE|BIG)\s+ENDIAN\b").unwrap());

fn free_text_re(label: &str) -> Regex {
    // Capture runs to the first 2+ space gap (fixed-width headers pad
    // with spaces between columns)
    Regex::new(&format!(
        r"(?i){label}\s*[:=]?\s*([A-Z0-9 .,&'\-_/]+?)(?:\s{{2,}}|$)"
    ))
    .unwrap()
}

/// First line (1-based) where any of the patterns matches.
fn search_lines<'a>(lines: &'a [String], patterns: &[&Regex]) -> Option<(u32, Captures<'a>)> {
    for (i, line) in lines.iter().enumerate() {
        for p in patterns {
            if let Some(caps) = p.captures(line) {
                return Some((i as u32 + 1, caps));
            }
        }
    }
    None
}

/// Parse a numeric string allowing separators like commas/underscores/
/// spaces ("2,000" -> 2000.0, "1 000.5" -> 1000.5).
fn to_float(num: &str) -> Option<f64> {
    let cleaned: String = num
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse().ok()
}

/// Normalize a unitless sample interval value to milliseconds.
///
/// Heuristic: 100..10000 reads as microseconds (headers often quote
/// 2000/4000 us); anything else is assumed to already be ms.
fn maybe_ms(value: f64) -> f64 {
    if (100.0..=10000.0).contains(&value) {
        value / 1000.0
    } else {
        value
    }
}

/// Normalize free-text captures; drop empty or placeholder values.
fn clean_text_capture(raw: &str, label_hint: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }
    let is_placeholder = matches!(upper.as_str(), "N/A" | "NA" | "NONE" | "UNKNOWN" | "NULL" | "-")
        || upper == label_hint.to_uppercase();
    if is_placeholder {
        return None;
    }
    Some(upper)
}

fn ms_from_unit(raw: f64, unit: &str) -> f64 {
    match unit.to_uppercase().as_str() {
        "MS" | "MSEC" | "MILLISECOND" | "MILLISECONDS" => raw,
        "US" | "USEC" | "µS" | "MICROSECOND" | "MICROSECONDS" => raw / 1000.0,
        "S" | "SEC" | "SECOND" | "SECONDS" => raw * 1000.0,
        _ => raw,
    }
}

/// Deterministic baseline extraction from textual header lines.
///
/// Never fails; absence of signal just leaves fields out of the map.
pub fn parse_baseline(lines: &[String]) -> FieldMap {
    let mut out = FieldMap::new();

    // Sample interval: explicit MS matcher first, then any explicit
    // unit, then a unitless number with the microseconds heuristic.
    for (idx, line) in lines.iter().enumerate() {
        let lineno = idx as u32 + 1;
        if let Some((v, span)) = match_sample_interval_ms(line) {
            out.insert(
                HeaderField::SampleIntervalMs,
                Evidence::with_span(FieldValue::Float(v as f64), 0.9, lineno, span),
            );
            break;
        }
        if let Some(caps) = SAMPLE_INTERVAL_UNITS_RE.captures(line) {
            if let Some(raw) = to_float(&caps[1]) {
                let val_ms = ms_from_unit(raw, &caps[2]);
                out.insert(
                    HeaderField::SampleIntervalMs,
                    Evidence::new(FieldValue::Float(val_ms), 0.88, lineno),
                );
                break;
            }
        }
    }
    if !out.contains_key(&HeaderField::SampleIntervalMs) {
        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = SAMPLE_INTERVAL_BARE_RE.captures(line) {
                if let Some(raw) = to_float(&caps[1]) {
                    let conf = if (100.0..=10000.0).contains(&raw) { 0.85 } else { 0.7 };
                    out.insert(
                        HeaderField::SampleIntervalMs,
                        Evidence::new(FieldValue::Float(maybe_ms(raw)), conf, idx as u32 + 1),
                    );
                    break;
                }
            }
        }
    }

    // Samples per trace
    for (idx, line) in lines.iter().enumerate() {
        if let Some((v, span)) = match_samples_per_trace(line) {
            out.insert(
                HeaderField::SamplesPerTrace,
                Evidence::with_span(FieldValue::Int(v), 0.9, idx as u32 + 1, span),
            );
            break;
        }
    }

    // Record length: explicit with units, else derived si * spt
    if let Some((lineno, caps)) =
        search_lines(lines, &[&RECORD_LENGTH_RES[0], &RECORD_LENGTH_RES[1]])
    {
        if let Some(raw) = to_float(&caps[1]) {
            let rl_ms = ms_from_unit(raw, &caps[2]);
            out.insert(
                HeaderField::RecordLengthMs,
                Evidence::new(FieldValue::Float(rl_ms), 0.9, lineno),
            );
        }
    }
    if !out.contains_key(&HeaderField::RecordLengthMs) {
        let si = out.get(&HeaderField::SampleIntervalMs).cloned();
        let spt = out.get(&HeaderField::SamplesPerTrace).cloned();
        if let (Some(si), Some(spt)) = (si, spt) {
            if let (Some(si_ms), Some(n)) = (si.value.as_f64(), spt.value.as_f64()) {
                let mut derived = si_ms * n;
                // reduce tiny float artifacts
                if (derived - derived.round()).abs() < 1e-6 {
                    derived = derived.round();
                }
                debug!(derived_ms = derived, "record length derived from si * spt");
                let refs: Vec<u32> = si
                    .line_refs
                    .iter()
                    .chain(spt.line_refs.iter())
                    .copied()
                    .collect();
                out.insert(
                    HeaderField::RecordLengthMs,
                    Evidence::from_lines(
                        FieldValue::Float(derived),
                        si.confidence.min(spt.confidence),
                        refs,
                    ),
                );
            }
        }
    }

    // Traces per record: span-reporting matcher first, then the
    // generic regex (optional DATA prefix, looser separators)
    let mut traces_done = false;
    for (idx, line) in lines.iter().enumerate() {
        if let Some((v, span)) = match_data_traces_per_record(line) {
            out.insert(
                HeaderField::DataTracesPerRecord,
                Evidence::with_span(FieldValue::Int(v), 0.8, idx as u32 + 1, span),
            );
            traces_done = true;
            break;
        }
    }
    if !traces_done {
        if let Some((lineno, caps)) = search_lines(lines, &[&TRACES_PER_RECORD_RE]) {
            if let Ok(n) = caps[1].parse::<i64>() {
                out.insert(
                    HeaderField::DataTracesPerRecord,
                    Evidence::new(FieldValue::Int(n), 0.8, lineno),
                );
            }
        }
    }

    // Auxiliary traces, bytes per sample
    for (idx, line) in lines.iter().enumerate() {
        if let Some((v, span)) = match_aux_traces_per_record(line) {
            out.insert(
                HeaderField::AuxiliaryTracesPerRecord,
                Evidence::with_span(FieldValue::Int(v), 0.7, idx as u32 + 1, span),
            );
            break;
        }
    }
    for (idx, line) in lines.iter().enumerate() {
        if let Some((v, span)) = match_bytes_per_sample(line) {
            out.insert(
                HeaderField::BytesPerSample,
                Evidence::with_span(FieldValue::Int(v), 0.8, idx as u32 + 1, span),
            );
            break;
        }
    }

    // Free-text tokens
    let free_text = [
        (HeaderField::Company, &*COMPANY_RE, "COMPANY", 0.8),
        (HeaderField::Client, &*CLIENT_RE, "CLIENT", 0.7),
        (HeaderField::Area, &*AREA_RE, "AREA", 0.7),
        (HeaderField::Contractor, &*CONTRACTOR_RE, "CONTRACTOR", 0.7),
    ];
    for (field, re, label, conf) in free_text {
        if let Some((lineno, caps)) = search_lines(lines, &[re]) {
            if let Some(val) = clean_text_capture(&caps[1], label) {
                out.insert(field, Evidence::new(val, conf, lineno));
            }
        }
    }

    // Survey/project name
    if let Some((lineno, caps)) = search_lines(lines, &[&PROJECT_NAME_RE]) {
        if let Some(val) = clean_text_capture(&caps[1], "PROJECT NAME") {
            out.insert(
                HeaderField::SurveyName,
                Evidence::new(val, 0.75, lineno),
            );
        }
    }

    // Acquisition year (from DATE: YYYY ...)
    if let Some((lineno, caps)) = search_lines(lines, &[&DATE_YEAR_RE]) {
        if let Ok(year) = caps[1].parse::<i64>() {
            if (1900..=2100).contains(&year) {
                out.insert(
                    HeaderField::AcquisitionYear,
                    Evidence::new(FieldValue::Int(year), 0.6, lineno),
                );
            }
        }
    }

    // Recording format: normalized matcher first, then free label
    let mut format_done = false;
    for (idx, line) in lines.iter().enumerate() {
        if let Some((v, span)) = match_format_this_reel(line) {
            out.insert(
                HeaderField::RecordingFormat,
                Evidence::with_span(v, 0.75, idx as u32 + 1, span),
            );
            format_done = true;
            break;
        }
    }
    if !format_done {
        if let Some((lineno, caps)) = search_lines(lines, &[&RECORDING_FORMAT_RE]) {
            out.insert(
                HeaderField::RecordingFormat,
                Evidence::new(caps[2].trim().to_uppercase(), 0.75, lineno),
            );
        }
    }

    // Measurement system
    if let Some((lineno, caps)) = search_lines(lines, &[&MEASUREMENT_SYSTEM_RE]) {
        let ms = match caps[1].to_uppercase().as_str() {
            "SI" | "METRIC" => "METRIC".to_string(),
            "IMPERIAL" | "FEET" | "FT" => "FEET".to_string(),
            other => other.to_string(),
        };
        out.insert(
            HeaderField::MeasurementSystem,
            Evidence::new(ms, 0.65, lineno),
        );
    }

    // Endianness hint: little-endian is non-standard for this format
    if let Some((lineno, caps)) = search_lines(lines, &[&ENDIAN_RE]) {
        if caps[1].to_uppercase() == "LITTLE" {
            out.entry(HeaderField::Notes).or_insert_with(|| {
                Evidence::new(
                    "Textual header indicates LITTLE ENDIAN; the format specifies \
                     big-endian. File may be non-standard.",
                    0.5,
                    lineno,
                )
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn explicit_ms_interval_wins() {
        let out = parse_baseline(&lines(&["C06 SAMPLE INTERVAL 2MS  SAMPLES/TRACE 1500"]));
        let si = &out[&HeaderField::SampleIntervalMs];
        assert_eq!(si.value, FieldValue::Float(2.0));
        assert_eq!(si.confidence, 0.9);
        assert_eq!(si.line_refs, vec![1]);
    }

    #[test]
    fn microsecond_interval_converts_to_ms() {
        let out = parse_baseline(&lines(&["SAMPLE INTERVAL: 2000 USEC"]));
        assert_eq!(
            out[&HeaderField::SampleIntervalMs].value,
            FieldValue::Float(2.0)
        );
    }

    #[test]
    fn unitless_interval_uses_microseconds_heuristic() {
        let out = parse_baseline(&lines(&["SAMPLE INTERVAL 4000"]));
        let si = &out[&HeaderField::SampleIntervalMs];
        assert_eq!(si.value, FieldValue::Float(4.0));
        assert_eq!(si.confidence, 0.85);

        let out = parse_baseline(&lines(&["SAMPLE INTERVAL 4"]));
        let si = &out[&HeaderField::SampleIntervalMs];
        assert_eq!(si.value, FieldValue::Float(4.0));
        assert_eq!(si.confidence, 0.7);
    }

    #[test]
    fn separators_in_numbers_are_tolerated() {
        let out = parse_baseline(&lines(&["SAMPLE INTERVAL 2,000 USEC"]));
        assert_eq!(
            out[&HeaderField::SampleIntervalMs].value,
            FieldValue::Float(2.0)
        );
    }

    #[test]
    fn record_length_derived_from_interval_and_samples() {
        let out = parse_baseline(&lines(&[
            "C06 SAMPLE INTERVAL 2MS",
            "C07 SAMPLES/TRACE 1500",
        ]));
        let rl = &out[&HeaderField::RecordLengthMs];
        assert_eq!(rl.value, FieldValue::Float(3000.0));
        assert_eq!(rl.confidence, 0.9);
        assert_eq!(rl.line_refs, vec![1, 2]);
    }

    #[test]
    fn explicit_record_length_beats_derivation() {
        let out = parse_baseline(&lines(&[
            "SAMPLE INTERVAL 2MS  SAMPLES/TRACE 1500",
            "RECORD LENGTH: 6 SEC",
        ]));
        assert_eq!(
            out[&HeaderField::RecordLengthMs].value,
            FieldValue::Float(6000.0)
        );
    }

    #[test]
    fn free_text_stops_at_column_gap_and_uppercases() {
        let out = parse_baseline(&lines(&["C02 COMPANY: Acme Geo    AREA: North Sea"]));
        assert_eq!(
            out[&HeaderField::Company].value,
            FieldValue::Text("ACME GEO".into())
        );
        assert_eq!(
            out[&HeaderField::Area].value,
            FieldValue::Text("NORTH SEA".into())
        );
    }

    #[test]
    fn placeholder_captures_are_dropped() {
        let out = parse_baseline(&lines(&["CLIENT: N/A", "CONTRACTOR: UNKNOWN"]));
        assert!(!out.contains_key(&HeaderField::Client));
        assert!(!out.contains_key(&HeaderField::Contractor));
    }

    #[test]
    fn data_traces_matcher_reports_span_with_generic_fallback() {
        let line = "C05 DATA TRACES/RECORD 240";
        let out = parse_baseline(&lines(&[line]));
        let ev = &out[&HeaderField::DataTracesPerRecord];
        assert_eq!(ev.value, FieldValue::Int(240));
        let (s, e) = ev.raw_spans.as_ref().unwrap()[0];
        assert_eq!(&line[s..e], "240");

        // bare label without the DATA prefix falls back to the generic
        // regex, which reports no span
        let out = parse_baseline(&lines(&["TRACES/RECORD: 96"]));
        let ev = &out[&HeaderField::DataTracesPerRecord];
        assert_eq!(ev.value, FieldValue::Int(96));
        assert!(ev.raw_spans.is_none());
    }

    #[test]
    fn date_year_gate() {
        let out = parse_baseline(&lines(&["DATE: 1987 JUNE"]));
        assert_eq!(
            out[&HeaderField::AcquisitionYear].value,
            FieldValue::Int(1987)
        );

        let out = parse_baseline(&lines(&["DATE: 3050"]));
        assert!(!out.contains_key(&HeaderField::AcquisitionYear));
    }

    #[test]
    fn measurement_system_is_normalized() {
        let out = parse_baseline(&lines(&["MEASUREMENT SYSTEM: SI"]));
        assert_eq!(
            out[&HeaderField::MeasurementSystem].value,
            FieldValue::Text("METRIC".into())
        );
    }

    #[test]
    fn little_endian_leaves_a_note() {
        let out = parse_baseline(&lines(&["C39 LITTLE ENDIAN BYTE ORDER"]));
        assert!(out.contains_key(&HeaderField::Notes));

        let out = parse_baseline(&lines(&["C39 BIG ENDIAN BYTE ORDER"]));
        assert!(!out.contains_key(&HeaderField::Notes));
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(parse_baseline(&[]).is_empty());
    }
}
