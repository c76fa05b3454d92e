//! Closed vocabulary of recognized header fields.
//!
//! Both extraction sources key their output by [`HeaderField`]; unknown
//! keys coming back from the inference provider are dropped before they
//! ever reach the arbiter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Evidence;

/// Mapping from field name to at most one piece of evidence.
///
/// Ordered so serialized output and provenance walk fields in a stable
/// order.
pub type FieldMap = BTreeMap<HeaderField, Evidence>;

/// Recognized metadata fields of a survey textual header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    SurveyName,
    Area,
    Contractor,
    Company,
    Client,
    AcquisitionYear,
    SampleIntervalMs,
    RecordLengthMs,
    SamplesPerTrace,
    DataTracesPerRecord,
    AuxiliaryTracesPerRecord,
    BytesPerSample,
    InlineSpacingM,
    CrosslineSpacingM,
    BinSizeM,
    Geometry,
    SourceType,
    ReceiverType,
    Datum,
    SrdM,
    CrsHint,
    Vessel,
    RecordingFormat,
    MeasurementSystem,
    Notes,
}

impl HeaderField {
    /// Every field in the vocabulary, in serialization order.
    pub const ALL: [HeaderField; 25] = [
        HeaderField::SurveyName,
        HeaderField::Area,
        HeaderField::Contractor,
        HeaderField::Company,
        HeaderField::Client,
        HeaderField::AcquisitionYear,
        HeaderField::SampleIntervalMs,
        HeaderField::RecordLengthMs,
        HeaderField::SamplesPerTrace,
        HeaderField::DataTracesPerRecord,
        HeaderField::AuxiliaryTracesPerRecord,
        HeaderField::BytesPerSample,
        HeaderField::InlineSpacingM,
        HeaderField::CrosslineSpacingM,
        HeaderField::BinSizeM,
        HeaderField::Geometry,
        HeaderField::SourceType,
        HeaderField::ReceiverType,
        HeaderField::Datum,
        HeaderField::SrdM,
        HeaderField::CrsHint,
        HeaderField::Vessel,
        HeaderField::RecordingFormat,
        HeaderField::MeasurementSystem,
        HeaderField::Notes,
    ];

    /// snake_case name used in prompts and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderField::SurveyName => "survey_name",
            HeaderField::Area => "area",
            HeaderField::Contractor => "contractor",
            HeaderField::Company => "company",
            HeaderField::Client => "client",
            HeaderField::AcquisitionYear => "acquisition_year",
            HeaderField::SampleIntervalMs => "sample_interval_ms",
            HeaderField::RecordLengthMs => "record_length_ms",
            HeaderField::SamplesPerTrace => "samples_per_trace",
            HeaderField::DataTracesPerRecord => "data_traces_per_record",
            HeaderField::AuxiliaryTracesPerRecord => "auxiliary_traces_per_record",
            HeaderField::BytesPerSample => "bytes_per_sample",
            HeaderField::InlineSpacingM => "inline_spacing_m",
            HeaderField::CrosslineSpacingM => "crossline_spacing_m",
            HeaderField::BinSizeM => "bin_size_m",
            HeaderField::Geometry => "geometry",
            HeaderField::SourceType => "source_type",
            HeaderField::ReceiverType => "receiver_type",
            HeaderField::Datum => "datum",
            HeaderField::SrdM => "srd_m",
            HeaderField::CrsHint => "crs_hint",
            HeaderField::Vessel => "vessel",
            HeaderField::RecordingFormat => "recording_format",
            HeaderField::MeasurementSystem => "measurement_system",
            HeaderField::Notes => "notes",
        }
    }

    /// Parse a snake_case field name; `None` for anything outside the
    /// vocabulary.
    pub fn parse(name: &str) -> Option<HeaderField> {
        HeaderField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
    }

    /// Fields whose values must coerce to a float to be accepted from
    /// the inference provider.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            HeaderField::SampleIntervalMs
                | HeaderField::RecordLengthMs
                | HeaderField::InlineSpacingM
                | HeaderField::CrosslineSpacingM
                | HeaderField::BinSizeM
                | HeaderField::SrdM
        )
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
