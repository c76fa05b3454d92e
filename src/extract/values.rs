//! Low-level value matchers for common header tokens.
//!
//! Each matcher returns the parsed value plus the byte span of the
//! matched number/token within the line, so display layers can
//! highlight exactly what was read.

use once_cell::sync::Lazy;
use regex::Regex;

static MS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*MS").unwrap());

static DATA_TRACES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DATA\s+TRACES/RECORD\s*[:=]?\s*(\d+)").unwrap());

static AUX_TRACES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)AUXILIARY\s+TRACES/RECORD\s*[:=]?\s*(\d+)").unwrap());

static SAMPLES_PER_TRACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SAMPLES/TRACE\s*[:=]?\s*(\d+)").unwrap());

static BYTES_PER_SAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)BYTES/SAMPLE\s*[:=]?\s*(\d+)").unwrap());

static FORMAT_THIS_REEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)FORMAT\s+THIS\s+REEL\s*[:=]?\s*(SEGY|SEG-Y)").unwrap());

// Accepts INTERVAL, INTERNAL, INTERxxx (frequent header typos)
static SAMPLE_INTERVAL_MS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SAMPLE\s+INTER\w*\s*[:=]?\s*(\d+)\s*MS").unwrap());

/// First integer followed by an MS unit anywhere in the line.
pub fn extract_ms(text: &str) -> Option<i64> {
    let caps = MS_RE.captures(text)?;
    caps.get(1)?.as_str().parse().ok()
}

fn int_with_span(re: &Regex, text: &str) -> Option<(i64, (usize, usize))> {
    let caps = re.captures(text)?;
    let group = caps.get(1)?;
    let value = group.as_str().parse().ok()?;
    Some((value, (group.start(), group.end())))
}

pub fn match_data_traces_per_record(text: &str) -> Option<(i64, (usize, usize))> {
    int_with_span(&DATA_TRACES_RE, text)
}

pub fn match_aux_traces_per_record(text: &str) -> Option<(i64, (usize, usize))> {
    int_with_span(&AUX_TRACES_RE, text)
}

pub fn match_samples_per_trace(text: &str) -> Option<(i64, (usize, usize))> {
    int_with_span(&SAMPLES_PER_TRACE_RE, text)
}

pub fn match_bytes_per_sample(text: &str) -> Option<(i64, (usize, usize))> {
    int_with_span(&BYTES_PER_SAMPLE_RE, text)
}

/// Recording format declaration, normalized to "SEGY".
pub fn match_format_this_reel(text: &str) -> Option<(String, (usize, usize))> {
    let caps = FORMAT_THIS_REEL_RE.captures(text)?;
    let group = caps.get(1)?;
    let value = group.as_str().to_uppercase().replace('-', "");
    Some((value, (group.start(), group.end())))
}

/// Sample interval with an explicit MS unit.
pub fn match_sample_interval_ms(text: &str) -> Option<(i64, (usize, usize))> {
    int_with_span(&SAMPLE_INTERVAL_MS_RE, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ms_value() {
        assert_eq!(extract_ms("SAMPLE INTERVAL 2MS"), Some(2));
        assert_eq!(extract_ms("RECORD LENGTH: 6000 ms"), Some(6000));
        assert_eq!(extract_ms("NO UNITS HERE"), None);
    }

    #[test]
    fn samples_per_trace_reports_span() {
        let line = "C06 SAMPLES/TRACE 1500  BITS/IN 6250";
        let (value, (start, end)) = match_samples_per_trace(line).unwrap();
        assert_eq!(value, 1500);
        assert_eq!(&line[start..end], "1500");
    }

    #[test]
    fn tolerates_interval_typos() {
        assert!(match_sample_interval_ms("SAMPLE INTERVAL 4 MS").is_some());
        assert!(match_sample_interval_ms("SAMPLE INTERNAL: 4MS").is_some());
        assert!(match_sample_interval_ms("SAMPLE RATE 4MS").is_none());
    }

    #[test]
    fn format_reel_normalizes_hyphen() {
        let (value, _) = match_format_this_reel("FORMAT THIS REEL: SEG-Y").unwrap();
        assert_eq!(value, "SEGY");
    }

    #[test]
    fn trace_count_and_bytes_matchers() {
        let line = "C05 DATA TRACES/RECORD 240";
        let (value, (start, end)) = match_data_traces_per_record(line).unwrap();
        assert_eq!(value, 240);
        assert_eq!(&line[start..end], "240");

        assert_eq!(
            match_aux_traces_per_record("AUXILIARY TRACES/RECORD 2").map(|v| v.0),
            Some(2)
        );
        assert_eq!(
            match_bytes_per_sample("BYTES/SAMPLE = 4").map(|v| v.0),
            Some(4)
        );
    }
}
