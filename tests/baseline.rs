//! Deterministic extractor integration tests
//!
//! Behaviors over a realistic fixed-width textual header.

use segiq::evidence::{FieldValue, HeaderField};
use segiq::extract::{gather_line_highlights, parse_baseline};

fn lines(input: &[&str]) -> Vec<String> {
    input.iter().map(|s| s.to_string()).collect()
}

fn header() -> Vec<String> {
    lines(&[
        "C01 CLIENT: NORTH SEA OIL AS        COMPANY: ACME GEO SERVICES",
        "C02 AREA: VIKING GRABEN             CONTRACTOR: SEISMIC PARTNERS",
        "C03 PROJECT NAME: VG-3D-EXT         DATE: 1998 JUNE",
        "C04 SAMPLE INTERVAL 2MS             SAMPLES/TRACE 1500",
        "C05 DATA TRACES/RECORD 240          AUXILIARY TRACES/RECORD 2",
        "C06 BYTES/SAMPLE 4                  FORMAT THIS REEL: SEG-Y",
        "C07 MEASUREMENT SYSTEM: METRIC",
    ])
}

#[test]
fn resolves_a_full_header() {
    let out = parse_baseline(&header());

    assert_eq!(
        out[&HeaderField::Client].value,
        FieldValue::Text("NORTH SEA OIL AS".into())
    );
    assert_eq!(
        out[&HeaderField::Company].value,
        FieldValue::Text("ACME GEO SERVICES".into())
    );
    assert_eq!(
        out[&HeaderField::Area].value,
        FieldValue::Text("VIKING GRABEN".into())
    );
    assert_eq!(
        out[&HeaderField::Contractor].value,
        FieldValue::Text("SEISMIC PARTNERS".into())
    );
    assert_eq!(
        out[&HeaderField::SurveyName].value,
        FieldValue::Text("VG-3D-EXT".into())
    );
    assert_eq!(
        out[&HeaderField::AcquisitionYear].value,
        FieldValue::Int(1998)
    );
    assert_eq!(
        out[&HeaderField::SampleIntervalMs].value,
        FieldValue::Float(2.0)
    );
    assert_eq!(out[&HeaderField::SamplesPerTrace].value, FieldValue::Int(1500));
    assert_eq!(
        out[&HeaderField::DataTracesPerRecord].value,
        FieldValue::Int(240)
    );
    assert_eq!(
        out[&HeaderField::AuxiliaryTracesPerRecord].value,
        FieldValue::Int(2)
    );
    assert_eq!(out[&HeaderField::BytesPerSample].value, FieldValue::Int(4));
    assert_eq!(
        out[&HeaderField::RecordingFormat].value,
        FieldValue::Text("SEGY".into())
    );
    assert_eq!(
        out[&HeaderField::MeasurementSystem].value,
        FieldValue::Text("METRIC".into())
    );
}

#[test]
fn record_length_derives_with_unioned_refs() {
    let out = parse_baseline(&header());
    let rl = &out[&HeaderField::RecordLengthMs];

    // 2 ms * 1500 samples, float artifacts rounded away
    assert_eq!(rl.value, FieldValue::Float(3000.0));
    assert_eq!(rl.line_refs, vec![4]);
    assert_eq!(rl.confidence, 0.9);
}

#[test]
fn all_evidence_carries_one_based_line_refs() {
    let out = parse_baseline(&header());
    for ev in out.values() {
        assert!(!ev.line_refs.is_empty());
        assert!(ev.line_refs.iter().all(|&l| l >= 1 && l <= 7));
    }
}

#[test]
fn spans_from_matchers_support_highlighting() {
    let input = header();
    let out = parse_baseline(&input);
    let highlights = gather_line_highlights(&out, &input);

    // SAMPLES/TRACE 1500 on line 4 has a span
    let spans = &highlights[&4];
    assert!(spans
        .iter()
        .any(|&(s, e)| &input[3][s..e] == "1500" || &input[3][s..e] == "2"));
}

#[test]
fn typo_tolerant_sample_interval_label() {
    let out = parse_baseline(&lines(&["SAMPLE INTERNAL: 4MS"]));
    assert_eq!(
        out[&HeaderField::SampleIntervalMs].value,
        FieldValue::Float(4.0)
    );
}

#[test]
fn seconds_unit_scales_to_ms() {
    let out = parse_baseline(&lines(&["RECORD LENGTH: 6 SEC", "SAMPLE INTERVAL 0.004 S"]));
    assert_eq!(
        out[&HeaderField::RecordLengthMs].value,
        FieldValue::Float(6000.0)
    );
    assert_eq!(
        out[&HeaderField::SampleIntervalMs].value,
        FieldValue::Float(4.0)
    );
}

#[test]
fn rlen_alias_is_recognized() {
    let out = parse_baseline(&lines(&["RLEN 6000 MS"]));
    assert_eq!(
        out[&HeaderField::RecordLengthMs].value,
        FieldValue::Float(6000.0)
    );
}

#[test]
fn label_echo_is_treated_as_placeholder() {
    // a header that just repeats the label as the value
    let out = parse_baseline(&lines(&["COMPANY: COMPANY"]));
    assert!(!out.contains_key(&HeaderField::Company));
}

#[test]
fn garbage_lines_yield_no_evidence() {
    let out = parse_baseline(&lines(&["", "\u{7f}\u{7f}\u{7f}", "1234567890", ":::::"]));
    assert!(out.is_empty());
}
